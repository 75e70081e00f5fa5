//! Monotonic time sources for measurement.
//!
//! The measurement loop only needs three things from a clock: a monotonic
//! reading, the elapsed time since an earlier reading, and the clock's
//! measured minimum resolution. [`MonotonicClock`] provides all three over
//! `std::time::Instant`; the trait keeps the measurement code agnostic to
//! the mechanism, which also lets tests substitute a scripted clock.

use std::sync::OnceLock;
use std::time::Instant;

use crate::time::Time;

/// An opaque point in time, as reported by some [`Clock`].
///
/// Ticks are only meaningful relative to other ticks from the same clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(Time);

impl Tick {
    /// A tick at the given offset from the clock's epoch.
    pub fn at(offset: Time) -> Tick {
        Tick(offset)
    }

    /// Elapsed time between two ticks of the same clock.
    pub fn elapsed_since(self, earlier: Tick) -> Time {
        self.0 - earlier.0
    }
}

/// A monotonic, non-suspending time source.
pub trait Clock {
    /// The current reading.
    fn now(&self) -> Tick;

    /// Time elapsed since `earlier`.
    fn elapsed(&self, earlier: Tick) -> Time {
        self.now().elapsed_since(earlier)
    }

    /// The smallest nonzero duration this clock can distinguish.
    ///
    /// Raw readings of zero get clamped up to this, so a quantized "0" is
    /// never reported as real latency.
    fn resolution(&self) -> Time;
}

/// The default clock, backed by `std::time::Instant`.
///
/// Resolution is measured once per process by timing adjacent reads and
/// cached; all instances share the measurement.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock { epoch: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> MonotonicClock {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Tick {
        Tick(Time::from(self.epoch.elapsed()))
    }

    fn resolution(&self) -> Time {
        static RESOLUTION: OnceLock<Time> = OnceLock::new();
        *RESOLUTION.get_or_init(measure_resolution)
    }
}

/// Smallest observed nonzero gap between adjacent `Instant` reads.
fn measure_resolution() -> Time {
    let mut best = Time::ETERNITY;
    for _ in 0..8 {
        let start = Instant::now();
        let mut next = Instant::now();
        while next == start {
            next = Instant::now();
        }
        let delta = Time::from(next.duration_since(start));
        if delta < best {
            best = delta;
        }
    }
    best.or_if_zero(Time::NANOSECOND)
}
