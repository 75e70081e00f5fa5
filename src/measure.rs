//! The measurement loop: stopwatches and adaptive calibration.
//!
//! One call to [`calibrated_measure`] produces a single elapsed-time
//! estimate for a workload, repeating it as many times as a time budget
//! allows. Two timing conventions are supported:
//!
//! - **direct**: the harness brackets the whole call with clock reads;
//! - **nested**: the workload calls [`Stopwatch::measure`] around its hot
//!   section, excluding its own setup and teardown from the reading.
//!
//! The convention is detected on the first invocation and fixed from then
//! on; a workload that switches conventions mid-run is a defect in the
//! benchmark definition and panics immediately.
//!
//! Estimates report the running *minimum*, not the mean: benchmark noise is
//! one-sided, since contention and preemption can only inflate latency.

use tracing::debug;

use crate::clock::Clock;
use crate::size::Size;
use crate::time::Time;

pub use std::hint::black_box;

/// One batch never runs the body more than this many times, bounding the
/// damage a single preemption event can do to a per-call estimate.
const MAX_BATCH: u64 = 100;

/// Absolute elapsed time below which the amortized cutoff never fires, so
/// slow-but-tiny sizes aren't cut by fixed overhead.
const CUTOFF_FLOOR: Time = Time::SECOND;

/// Timing scope handed to a workload.
///
/// A workload that wants to exclude setup and teardown wraps its hot
/// section in [`Stopwatch::measure`]; otherwise the harness times the whole
/// invocation.
pub struct Stopwatch<'a> {
    clock: &'a dyn Clock,
    expect_nested: Option<bool>,
    elapsed: Option<Time>,
}

impl<'a> Stopwatch<'a> {
    fn new(clock: &'a dyn Clock, expect_nested: Option<bool>) -> Stopwatch<'a> {
        Stopwatch { clock, expect_nested, elapsed: None }
    }

    /// The clock this stopwatch reads.
    pub fn clock(&self) -> &dyn Clock {
        self.clock
    }

    /// Time `body` and record the reading as this invocation's result.
    ///
    /// Panics if the enclosing task already established direct timing, or if
    /// the workload reports more than once per invocation.
    pub fn measure<R>(&mut self, body: impl FnOnce() -> R) -> R {
        assert!(
            self.expect_nested != Some(false),
            "workload switched to self-timing after whole-call timing was established"
        );
        assert!(
            self.elapsed.is_none(),
            "workload reported its elapsed time more than once in a single invocation"
        );
        let start = self.clock.now();
        let result = body();
        self.elapsed = Some(self.clock.elapsed(start));
        result
    }
}

/// Budget for one calibrated measurement.
#[derive(Clone, Copy, Debug)]
pub struct MeasurementOptions {
    /// Target number of repetitions once `minimum_duration` is met.
    pub iterations: u64,
    /// Keep repeating at least until this much wall-clock has passed.
    pub minimum_duration: Time,
    /// Hard wall-clock ceiling; the loop self-terminates past it.
    pub maximum_duration: Time,
}

impl Default for MeasurementOptions {
    fn default() -> MeasurementOptions {
        MeasurementOptions {
            iterations: 1,
            minimum_duration: Time::ZERO,
            maximum_duration: Time::ETERNITY,
        }
    }
}

/// Run `body` once with mode detection. Returns the elapsed time and
/// whether the workload timed itself.
fn measure_first(clock: &dyn Clock, body: &mut dyn FnMut(&mut Stopwatch<'_>)) -> (Time, bool) {
    let mut stopwatch = Stopwatch::new(clock, None);
    let start = clock.now();
    body(&mut stopwatch);
    let whole = clock.elapsed(start);
    match stopwatch.elapsed {
        Some(inner) => (inner, true),
        None => (whole, false),
    }
}

/// Run `body` once in nested mode, returning its self-reported time.
///
/// Panics if the workload stops reporting after nested mode was
/// established.
fn nested_measure(clock: &dyn Clock, body: &mut dyn FnMut(&mut Stopwatch<'_>)) -> Time {
    let mut stopwatch = Stopwatch::new(clock, Some(true));
    body(&mut stopwatch);
    match stopwatch.elapsed {
        Some(elapsed) => elapsed,
        None => panic!("workload stopped self-timing after self-timing was established"),
    }
}

/// Run `body` `count` times bracketed by one pair of clock reads, returning
/// the per-call estimate.
fn iterating_measure(
    clock: &dyn Clock,
    body: &mut dyn FnMut(&mut Stopwatch<'_>),
    count: u64,
) -> Time {
    debug_assert!(count > 0);
    let start = clock.now();
    for _ in 0..count {
        let mut stopwatch = Stopwatch::new(clock, Some(false));
        body(&mut stopwatch);
    }
    let total = clock.elapsed(start).or_if_zero(clock.resolution());
    total.divided_by(count)
}

/// Size of the next direct-mode batch.
///
/// While under the minimum duration, estimates how many more calls are
/// needed from the average so far; afterwards, batches up to the remaining
/// iteration budget. Always in `1..=MAX_BATCH`.
fn next_batch(done: u64, elapsed: Time, options: &MeasurementOptions, resolution: Time) -> u64 {
    if elapsed < options.minimum_duration {
        let average = elapsed.divided_by(done.max(1)).or_if_zero(resolution);
        let shortfall = (options.minimum_duration - elapsed).as_seconds();
        let estimate = (shortfall / average.as_seconds()).ceil();
        if estimate >= MAX_BATCH as f64 {
            MAX_BATCH
        } else {
            (estimate as u64).max(1)
        }
    } else {
        options.iterations.saturating_sub(done).clamp(1, MAX_BATCH)
    }
}

/// Produce one elapsed-time estimate for a workload under `options`.
///
/// Detects the timing convention on the first run, then repeats until the
/// budget is spent, reporting the running minimum. A first reading of zero
/// is clamped up to the clock's resolution.
pub fn calibrated_measure(
    clock: &dyn Clock,
    options: &MeasurementOptions,
    body: &mut dyn FnMut(&mut Stopwatch<'_>),
) -> Time {
    let start = clock.now();
    let (first, nested) = measure_first(clock, body);
    let mut minimum = first.or_if_zero(clock.resolution());
    debug!(
        nested,
        first = %minimum,
        "detected timing mode"
    );
    if nested {
        let mut done: u64 = 1;
        loop {
            let elapsed = clock.elapsed(start);
            if elapsed > options.maximum_duration {
                break;
            }
            if done > options.iterations && elapsed > options.minimum_duration {
                break;
            }
            let next = nested_measure(clock, body).or_if_zero(clock.resolution());
            if next < minimum {
                minimum = next;
            }
            done += 1;
        }
        debug!(iterations = done, result = %minimum, "nested measurement finished");
    } else {
        let mut done: u64 = 1;
        loop {
            let elapsed = clock.elapsed(start);
            if elapsed > options.maximum_duration {
                break;
            }
            if done >= options.iterations && elapsed > options.minimum_duration {
                break;
            }
            let batch = next_batch(done, elapsed, options, clock.resolution());
            let estimate = iterating_measure(clock, body, batch);
            if estimate < minimum {
                minimum = estimate;
            }
            done += batch;
        }
        debug!(iterations = done, result = %minimum, "direct measurement finished");
    }
    minimum
}

/// Whether measurement of a task should stop at `size` and beyond.
///
/// Fires only when the per-element time exceeds `cutoff` *and* the absolute
/// elapsed time is past the one-second floor.
pub(crate) fn amortized_cutoff_reached(elapsed: Time, size: Size, cutoff: Time) -> bool {
    elapsed > CUTOFF_FLOOR && elapsed.amortized(size) > cutoff
}
