//! Samples: multisets of elapsed-time measurements with derived statistics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::sorted::SortedBag;
use crate::time::Time;

/// The measurements collected for one (task, size) pair, kept ascending.
///
/// A sample starts empty and accumulates one time per measurement event.
/// Statistics that are undefined for the current count return `None` rather
/// than zero: an empty sample has no mean, and a singleton has no deviation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    times: SortedBag<Time>,
}

impl Sample {
    /// Create an empty sample.
    pub fn new() -> Sample {
        Sample { times: SortedBag::new() }
    }

    /// The measurements in ascending order.
    pub fn times(&self) -> &[Time] {
        self.times.as_slice()
    }

    /// Number of measurements.
    pub fn count(&self) -> usize {
        self.times.len()
    }

    /// Whether the sample holds no measurements.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The fastest measurement.
    pub fn minimum(&self) -> Option<Time> {
        self.times.first().copied()
    }

    /// The slowest measurement.
    pub fn maximum(&self) -> Option<Time> {
        self.times.last().copied()
    }

    /// Sum of all measurements.
    pub fn sum(&self) -> Time {
        self.times
            .iter()
            .fold(Time::ZERO, |total, &time| total + time)
    }

    /// Sum of squared measurements, in seconds squared.
    pub fn sum_squared(&self) -> f64 {
        self.times
            .iter()
            .map(|time| time.as_seconds() * time.as_seconds())
            .sum()
    }

    /// Arithmetic mean, or `None` for an empty sample.
    pub fn mean(&self) -> Option<Time> {
        match self.count() {
            0 => None,
            n => Some(Time::attoseconds(self.sum().as_attoseconds() / n as i128)),
        }
    }

    /// Corrected sample standard deviation, or `None` below two
    /// measurements.
    ///
    /// Uses the two-pass formula `sqrt((n·Σx² − (Σx)²) / (n·(n−1)))`. A
    /// constant sample reports exactly zero.
    pub fn standard_deviation(&self) -> Option<Time> {
        let n = self.count();
        if n < 2 {
            return None;
        }
        if self.minimum() == self.maximum() {
            return Some(Time::ZERO);
        }
        let c = n as f64;
        let sum = self.sum().as_seconds();
        let s2 = (c * self.sum_squared() - sum * sum) / (c * (c - 1.0));
        Some(Time::seconds(s2.abs().sqrt()))
    }

    /// Record one measurement.
    ///
    /// Panics on a negative duration; clocks in this crate cannot produce
    /// one, so a negative here is a defect in the caller.
    pub fn add(&mut self, time: Time) {
        assert!(time >= Time::ZERO, "sample times must be nonnegative");
        self.times.insert(time);
    }

    /// Union with another sample's measurements (batch re-sort path).
    pub fn add_all(&mut self, other: &Sample) {
        self.times.insert_all(other.times().iter().copied());
    }

    /// A copy keeping only the fastest entries.
    ///
    /// `percentile` is in `0..=100`; the copy keeps the `ceil(P/100 · count)`
    /// smallest measurements. 100 keeps everything; 0 keeps at most the
    /// single fastest entry; the kept range is never negative.
    pub fn discarding_percentile(&self, above: f64) -> Sample {
        let count = self.count();
        let ordinal_rank = ((above / 100.0) * count as f64).ceil() as i64;
        if ordinal_rank >= count as i64 {
            return self.clone();
        }
        let keep = ordinal_rank.max(0) as usize;
        Sample {
            times: self.times()[..keep].iter().copied().collect(),
        }
    }

    /// The value of `statistic` for this sample, when defined.
    pub fn statistic(&self, statistic: Statistic) -> Option<Time> {
        match statistic {
            Statistic::Maximum => self.maximum(),
            Statistic::Sigma(n) => {
                let sigma = self.standard_deviation()?;
                let mean = self.mean()?;
                Some(Time::seconds(
                    mean.as_seconds() + n as f64 * sigma.as_seconds(),
                ))
            }
            Statistic::Mean => self.mean(),
            Statistic::Minimum => self.minimum(),
            Statistic::None => None,
        }
    }
}

impl FromIterator<Time> for Sample {
    fn from_iter<I: IntoIterator<Item = Time>>(iter: I) -> Sample {
        Sample { times: iter.into_iter().collect() }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count() {
            0 => write!(f, "[0 samples]"),
            1 => write!(f, "[1 sample at {}]", self.times()[0]),
            n => {
                let mean = self.mean().expect("nonempty");
                let deviation = self.standard_deviation().expect("n >= 2");
                write!(
                    f,
                    "[{} samples with μ: {} σ: {:.3}%]",
                    n,
                    mean,
                    deviation.as_seconds() / mean.as_seconds()
                )
            }
        }
    }
}

// A sample persists as its plain list of times.

impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.times())
    }
}

impl<'de> Deserialize<'de> for Sample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Sample, D::Error> {
        let times = Vec::<Time>::deserialize(deserializer)?;
        if times.iter().any(|&t| t < Time::ZERO) {
            return Err(serde::de::Error::custom("negative duration in sample"));
        }
        Ok(times.into_iter().collect())
    }
}

/// Selects one summary value out of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// The slowest measurement.
    Maximum,
    /// Mean plus `n` standard deviations.
    Sigma(i32),
    /// The arithmetic mean.
    Mean,
    /// The fastest measurement.
    Minimum,
    /// No value.
    None,
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Maximum => write!(f, "max"),
            Statistic::Sigma(n) => write!(f, "{}sigma", n),
            Statistic::Mean => write!(f, "mean"),
            Statistic::Minimum => write!(f, "min"),
            Statistic::None => write!(f, "none"),
        }
    }
}

impl FromStr for Statistic {
    type Err = ();

    fn from_str(text: &str) -> Result<Statistic, ()> {
        match text {
            "maximum" | "max" => Ok(Statistic::Maximum),
            "mean" => Ok(Statistic::Mean),
            "minimum" | "min" => Ok(Statistic::Minimum),
            "none" => Ok(Statistic::None),
            _ => {
                let number = text.strip_suffix("sigma").ok_or(())?;
                number.parse().map(Statistic::Sigma).map_err(|_| ())
            }
        }
    }
}
