//! Signed elapsed-time values with attosecond resolution.
//!
//! `Time` is the unit every measurement in this crate is expressed in. It is
//! stored as a 128-bit attosecond count, so every unit constructor from
//! seconds down to attoseconds is exact, sums of realistic benchmark runs
//! cannot overflow, and the persisted form round-trips bit-for-bit.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;
use crate::size::Size;

const ATTOS_PER_SECOND: i128 = 1_000_000_000_000_000_000;

/// A signed duration, stored as attoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    attos: i128,
}

impl Time {
    /// The zero duration.
    pub const ZERO: Time = Time { attos: 0 };
    /// An unboundedly large duration; useful as a "no limit" sentinel.
    ///
    /// Arithmetic saturates, so adding to eternity stays eternity.
    pub const ETERNITY: Time = Time { attos: i128::MAX };

    /// One second.
    pub const SECOND: Time = Time { attos: ATTOS_PER_SECOND };
    /// One millisecond.
    pub const MILLISECOND: Time = Time { attos: ATTOS_PER_SECOND / 1_000 };
    /// One microsecond.
    pub const MICROSECOND: Time = Time { attos: ATTOS_PER_SECOND / 1_000_000 };
    /// One nanosecond.
    pub const NANOSECOND: Time = Time { attos: 1_000_000_000 };
    /// One picosecond.
    pub const PICOSECOND: Time = Time { attos: 1_000_000 };
    /// One femtosecond.
    pub const FEMTOSECOND: Time = Time { attos: 1_000 };
    /// One attosecond, the smallest representable nonzero duration.
    pub const ATTOSECOND: Time = Time { attos: 1 };

    /// Create a time from a fractional second count.
    ///
    /// Non-finite inputs map to the nearest sentinel: NaN becomes zero,
    /// out-of-range magnitudes saturate.
    pub fn seconds(seconds: f64) -> Time {
        if seconds.is_nan() {
            return Time::ZERO;
        }
        // `as` saturates out-of-range floats.
        Time { attos: (seconds * ATTOS_PER_SECOND as f64).round() as i128 }
    }

    /// Create a time from fractional milliseconds.
    pub fn milliseconds(value: f64) -> Time {
        Time::seconds(value * 1e-3)
    }

    /// Create a time from fractional microseconds.
    pub fn microseconds(value: f64) -> Time {
        Time::seconds(value * 1e-6)
    }

    /// Create a time from fractional nanoseconds.
    pub fn nanoseconds(value: f64) -> Time {
        Time::seconds(value * 1e-9)
    }

    /// Create a time from an exact attosecond count.
    pub const fn attoseconds(attos: i128) -> Time {
        Time { attos }
    }

    /// The exact attosecond count.
    pub fn as_attoseconds(self) -> i128 {
        self.attos
    }

    /// The duration as a (possibly lossy) fractional second count.
    pub fn as_seconds(self) -> f64 {
        self.attos as f64 / ATTOS_PER_SECOND as f64
    }

    /// Per-element time: this duration divided by `size`.
    ///
    /// A zero size leaves the value unchanged.
    pub fn amortized(self, size: Size) -> Time {
        match size.get() {
            0 => self,
            n => Time { attos: self.attos / n as i128 },
        }
    }

    /// Divide evenly across `n` repetitions.
    pub(crate) fn divided_by(self, n: u64) -> Time {
        debug_assert!(n > 0);
        Time { attos: self.attos / n as i128 }
    }

    /// Substitute `fallback` when the reading is zero or negative.
    ///
    /// Used to clamp raw clock readings up to the clock's resolution, so a
    /// quantized "0" is never reported as real latency.
    pub(crate) fn or_if_zero(self, fallback: Time) -> Time {
        if self > Time::ZERO {
            self
        } else {
            fallback
        }
    }
}

impl From<std::time::Duration> for Time {
    fn from(duration: std::time::Duration) -> Time {
        let attos = duration.as_secs() as i128 * ATTOS_PER_SECOND
            + duration.subsec_nanos() as i128 * 1_000_000_000;
        Time { attos }
    }
}

impl Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time { attos: self.attos.saturating_add(rhs.attos) }
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Time) {
        *self = *self + rhs;
    }
}

impl Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time { attos: self.attos.saturating_sub(rhs.attos) }
    }
}

/// Format with three significant digits, trimming trailing zeros.
pub(crate) fn format_sig3(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let exponent = v.abs().log10().floor() as i32;
    let decimals = (2 - exponent).max(0) as usize;
    let mut s = format!("{:.*}", decimals, v);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

impl fmt::Display for Time {
    /// Pick the largest unit that keeps the mantissa at or above one, with
    /// three significant digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = *self;
        let s = t.as_seconds();
        if t == Time::ZERO {
            write!(f, "0")
        } else if t < Time::FEMTOSECOND {
            write!(f, "{}as", format_sig3(s * 1e18))
        } else if t < Time::PICOSECOND {
            write!(f, "{}fs", format_sig3(s * 1e15))
        } else if t < Time::NANOSECOND {
            write!(f, "{}ps", format_sig3(s * 1e12))
        } else if t < Time::MICROSECOND {
            write!(f, "{}ns", format_sig3(s * 1e9))
        } else if t < Time::MILLISECOND {
            write!(f, "{}µs", format_sig3(s * 1e6))
        } else if t < Time::SECOND {
            write!(f, "{}ms", format_sig3(s * 1e3))
        } else if s < 1000.0 {
            write!(f, "{}s", format_sig3(s))
        } else {
            write!(f, "{}s", s.round())
        }
    }
}

impl FromStr for Time {
    type Err = Error;

    /// Parse a float with an optional unit suffix; no suffix means seconds.
    fn from_str(text: &str) -> Result<Time, Error> {
        let invalid = || Error::InvalidTime { text: text.to_string() };
        let lowered = text.trim().to_lowercase();
        let split = lowered
            .find(|c: char| !matches!(c, '+' | '-' | '.' | 'e' | '0'..='9'))
            .unwrap_or(lowered.len());
        let (number, suffix) = lowered.split_at(split);
        let value: f64 = number.parse().map_err(|_| invalid())?;
        let scale = match suffix {
            "" | "s" => 1.0,
            "ms" => 1e-3,
            "µs" | "us" => 1e-6,
            "ns" => 1e-9,
            "ps" => 1e-12,
            "fs" => 1e-15,
            "as" => 1e-18,
            _ => return Err(invalid()),
        };
        Ok(Time::seconds(value * scale))
    }
}

// The persisted encoding splits the attosecond count into two 64-bit halves,
// `[high, low]`, so the value survives JSON without precision loss. Older
// documents stored a bare float second count; decoding still accepts that.

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let high = (self.attos >> 64) as i64;
        let low = self.attos as u64;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&high)?;
        tuple.serialize_element(&low)?;
        tuple.end()
    }
}

struct TimeVisitor;

impl<'de> Visitor<'de> for TimeVisitor {
    type Value = Time;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a [high, low] duration pair or a float second count")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Time, A::Error> {
        let high: i64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let low: u64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        Ok(Time { attos: ((high as i128) << 64) | low as i128 })
    }

    fn visit_f64<E: de::Error>(self, seconds: f64) -> Result<Time, E> {
        Ok(Time::seconds(seconds))
    }

    fn visit_i64<E: de::Error>(self, seconds: i64) -> Result<Time, E> {
        Ok(Time::seconds(seconds as f64))
    }

    fn visit_u64<E: de::Error>(self, seconds: u64) -> Result<Time, E> {
        Ok(Time::seconds(seconds as f64))
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        deserializer.deserialize_any(TimeVisitor)
    }
}
