//! Input sizes and geometric size progressions.
//!
//! A `Size` is the cardinality of a task's input, not a byte count. Sizes
//! print and parse with binary suffixes (`3k` is 3 × 2^10 = 3072), and can be
//! rounded to a number of significant bits to generate the smooth
//! exponential size series benchmarks are measured over.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;
use crate::time::format_sig3;

/// A nonnegative input cardinality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Size(u64);

impl Size {
    /// Create a size with the given element count.
    pub const fn new(value: u64) -> Size {
        Size(value)
    }

    /// The element count.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The canonical lossless text form: plain decimal digits.
    ///
    /// This is the form used for document keys; it sorts and round-trips
    /// identically across tools, unlike the suffixed display form.
    pub fn key_string(self) -> String {
        self.0.to_string()
    }
}

impl From<u64> for Size {
    fn from(value: u64) -> Size {
        Size(value)
    }
}

impl fmt::Display for Size {
    /// Binary-suffix form with three significant digits: `3.75k`, `16M`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0 as f64;
        if self.0 >= 1 << 40 {
            write!(f, "{}T", format_sig3(v / (1u64 << 40) as f64))
        } else if self.0 >= 1 << 30 {
            write!(f, "{}G", format_sig3(v / (1u64 << 30) as f64))
        } else if self.0 >= 1 << 20 {
            write!(f, "{}M", format_sig3(v / (1u64 << 20) as f64))
        } else if self.0 >= 1 << 10 {
            write!(f, "{}k", format_sig3(v / (1u64 << 10) as f64))
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Size {
    type Err = Error;

    /// Parse decimal digits with an optional binary suffix (`k`, `M`, `G`,
    /// `T`, case-insensitive).
    fn from_str(text: &str) -> Result<Size, Error> {
        let invalid = || Error::InvalidSize { text: text.to_string() };
        let digit_end = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (digits, suffix) = text.split_at(digit_end);
        let value: u64 = digits.parse().map_err(|_| invalid())?;
        let shift = match suffix {
            "" => 0,
            "k" | "K" => 10,
            "m" | "M" => 20,
            "g" | "G" => 30,
            "t" | "T" => 40,
            _ => return Err(invalid()),
        };
        value
            .checked_shl(shift)
            .filter(|v| v >> shift == value)
            .map(Size)
            .ok_or_else(invalid)
    }
}

// Sizes persist as decimal-digit strings, never JSON numbers, so document
// keys keep a stable ordering across tools.

impl Serialize for Size {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key_string())
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Size, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse::<u64>()
            .map(Size)
            .map_err(|_| serde::de::Error::custom(format!("not an integer: '{}'", text)))
    }
}

fn minimum_bit_width(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

fn check_significant_bits(bits: u32) {
    assert!(
        (1..=u64::BITS).contains(&bits),
        "significant bit count must be between 1 and 64"
    );
}

impl Size {
    /// Round down to `bits` significant bits.
    ///
    /// Values narrower than `bits` are already exact and come back unchanged.
    pub fn rounded_down(self, bits: u32) -> Size {
        check_significant_bits(bits);
        let width = minimum_bit_width(self.0);
        if width <= bits {
            return self;
        }
        Size(self.0 & (u64::MAX << (width - bits)))
    }

    /// The next representable size above `self` with `bits` significant bits.
    pub fn next_up(self, bits: u32) -> Size {
        check_significant_bits(bits);
        let width = minimum_bit_width(self.0);
        if width <= bits {
            return Size(self.0 + 1);
        }
        let shift = width - bits;
        Size((self.0 + (1 << shift)) & (u64::MAX << shift))
    }

    /// Every size in `range` with at most `bits` significant bits, ascending.
    ///
    /// This is the geometric progression benchmarks sweep over: each power of
    /// two plus `2^bits − 2^(bits−1)` evenly spaced subdivisions in between.
    pub fn sizes(range: RangeInclusive<Size>, bits: u32) -> Vec<Size> {
        check_significant_bits(bits);
        let mut result = Vec::new();
        let mut value = range.start().rounded_down(bits);
        while value < *range.start() {
            value = value.next_up(bits);
        }
        while value <= *range.end() {
            result.push(value);
            value = value.next_up(bits);
        }
        result
    }
}
