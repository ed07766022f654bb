//! Fixed-point resource quantities
//!
//! A [`Quantity`] is an exact amount of a scalar resource (CPU cores, memory
//! bytes) stored in milli-units. Quantities parse from and print to the
//! Kubernetes-style notation used in deployment manifests (`"500m"`, `"3.5"`,
//! `"8Gi"`), order by value, and subtract without clamping at zero so that an
//! over-reserved capacity stays negative and still compares correctly.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Sub;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MILLIS_PER_UNIT: i128 = 1000;

/// Longest fractional part accepted when parsing
const MAX_FRACTION_DIGITS: usize = 18;

const BINARY_SUFFIXES: [(&str, i128); 6] = [
    ("Ei", 1 << 60),
    ("Pi", 1 << 50),
    ("Ti", 1 << 40),
    ("Gi", 1 << 30),
    ("Mi", 1 << 20),
    ("Ki", 1 << 10),
];

/// Errors produced while parsing a quantity string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("invalid number in quantity '{0}'")]
    InvalidNumber(String),

    #[error("unknown suffix '{suffix}' in quantity '{input}'")]
    UnknownSuffix { input: String, suffix: String },

    #[error("quantity '{0}' is out of range")]
    OutOfRange(String),
}

/// How a quantity renders itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantityFormat {
    /// Plain decimal amounts (CPU cores, decimal SI suffixes)
    #[default]
    DecimalSI,
    /// Power-of-two byte amounts (Ki, Mi, Gi, ...)
    BinarySI,
}

/// An exact, comparable, subtractable resource amount
#[derive(Debug, Clone, Copy, Default)]
pub struct Quantity {
    millis: i128,
    format: QuantityFormat,
}

impl Quantity {
    /// Create a quantity from a raw milli-unit value
    pub const fn from_millis(millis: i128, format: QuantityFormat) -> Self {
        Self { millis, format }
    }

    /// Whole decimal units (e.g. CPU cores)
    pub const fn from_units(units: i64) -> Self {
        Self::from_millis(units as i128 * MILLIS_PER_UNIT, QuantityFormat::DecimalSI)
    }

    /// Milli-units (e.g. millicores)
    pub const fn milli(millis: i64) -> Self {
        Self::from_millis(millis as i128, QuantityFormat::DecimalSI)
    }

    /// A byte amount rendered with binary suffixes
    pub const fn bytes(bytes: i64) -> Self {
        Self::from_millis(bytes as i128 * MILLIS_PER_UNIT, QuantityFormat::BinarySI)
    }

    pub const fn zero() -> Self {
        Self::from_millis(0, QuantityFormat::DecimalSI)
    }

    pub fn milli_value(&self) -> i128 {
        self.millis
    }

    pub fn format(&self) -> QuantityFormat {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }

    pub fn is_negative(&self) -> bool {
        self.millis < 0
    }

    pub fn is_positive(&self) -> bool {
        self.millis > 0
    }

    fn write_decimal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis < 0 {
            f.write_str("-")?;
        }
        let magnitude = self.millis.unsigned_abs();
        let whole = magnitude / MILLIS_PER_UNIT as u128;
        let fraction = magnitude % MILLIS_PER_UNIT as u128;
        if fraction == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:03}", fraction);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.millis == other.millis
    }
}

impl Eq for Quantity {}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.millis.hash(state);
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.millis.cmp(&other.millis)
    }
}

/// Non-clamping subtraction; the result keeps the left-hand format.
impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity {
            millis: self.millis.saturating_sub(rhs.millis),
            format: self.format,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.format == QuantityFormat::BinarySI && self.millis % MILLIS_PER_UNIT == 0 {
            let bytes = self.millis / MILLIS_PER_UNIT;
            if bytes != 0 {
                for (suffix, factor) in BINARY_SUFFIXES {
                    if bytes % factor == 0 {
                        return write!(f, "{}{}", bytes / factor, suffix);
                    }
                }
            }
            return write!(f, "{}", bytes);
        }
        self.write_decimal(f)
    }
}

/// Returns (numerator, denominator, format) for a suffix
fn suffix_scale(suffix: &str) -> Option<(i128, i128, QuantityFormat)> {
    let decimal = |n: i128| Some((n, 1, QuantityFormat::DecimalSI));
    match suffix {
        "" => decimal(1),
        "m" => Some((1, 1000, QuantityFormat::DecimalSI)),
        "k" => decimal(1_000),
        "M" => decimal(1_000_000),
        "G" => decimal(1_000_000_000),
        "T" => decimal(1_000_000_000_000),
        "P" => decimal(1_000_000_000_000_000),
        "E" => decimal(1_000_000_000_000_000_000),
        _ => BINARY_SUFFIXES
            .iter()
            .find(|(s, _)| *s == suffix)
            .map(|(_, factor)| (*factor, 1, QuantityFormat::BinarySI)),
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let split = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(split);

        let (numerator, denominator, format) =
            suffix_scale(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
                input: input.to_string(),
                suffix: suffix.to_string(),
            })?;

        let invalid = || QuantityError::InvalidNumber(input.to_string());
        let out_of_range = || QuantityError::OutOfRange(input.to_string());

        let (whole, fraction) = match number.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (number, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.contains('.') || fraction.len() > MAX_FRACTION_DIGITS {
            return Err(invalid());
        }

        // Digits as one integer mantissa scaled by 10^fraction.len()
        let mut mantissa: i128 = 0;
        for digit in whole.bytes().chain(fraction.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit - b'0')))
                .ok_or_else(out_of_range)?;
        }
        let scale = 10i128.pow(fraction.len() as u32);

        let dividend = mantissa
            .checked_mul(numerator)
            .and_then(|v| v.checked_mul(MILLIS_PER_UNIT))
            .ok_or_else(out_of_range)?;
        let divisor = denominator.checked_mul(scale).ok_or_else(out_of_range)?;

        // Precision below one milli-unit rounds up in magnitude
        let mut millis = dividend / divisor;
        if dividend % divisor != 0 {
            millis += 1;
        }

        Ok(Quantity {
            millis: if negative { -millis } else { millis },
            format,
        })
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct QuantityVisitor;

impl Visitor<'_> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quantity string such as \"500m\" or \"8Gi\", or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        Ok(Quantity::from_units(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        let units = i64::try_from(v).map_err(E::custom)?;
        Ok(Quantity::from_units(units))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
        v.to_string().parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}
