//! Amounts
//!
//! The marketplace API is loose about numbers: prices, rates and durations may
//! arrive as JSON numbers, as strings (`"120.50"`), or not at all. Everything is
//! normalised here, at the decode boundary, so that pricing never has to deal
//! with malformed input.
//!
//! Missing values (absent, `null` or an empty string) decode to zero. Text that
//! is present but is not a number is rejected.

use std::fmt;

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;

/// Minor units per major unit for every supported currency.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Errors raised while normalising an amount.
#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    /// Text was present but could not be read as a number.
    #[error("malformed amount: {0:?}")]
    Malformed(String),

    /// A negative value was supplied where only non-negative values make sense.
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),

    /// The value does not fit in the target representation.
    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),
}

/// Wire representation of a loosely typed number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    fn into_decimal(self) -> Result<Decimal, AmountError> {
        match self {
            RawNumber::Int(value) => Ok(Decimal::from(value)),
            RawNumber::Float(value) => {
                Decimal::from_f64(value).ok_or_else(|| AmountError::Malformed(value.to_string()))
            }
            RawNumber::Text(text) => parse_decimal(&text),
        }
    }
}

/// Parse textual input into a decimal. Blank text is treated as zero.
///
/// # Errors
///
/// Returns [`AmountError::Malformed`] when non-blank text is not a number.
pub fn parse_decimal(text: &str) -> Result<Decimal, AmountError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    trimmed
        .parse::<Decimal>()
        .map_err(|_err| AmountError::Malformed(text.to_string()))
}

/// Convert a major-unit amount (e.g. `12.345`) into minor units, rounding half
/// away from zero.
///
/// # Errors
///
/// Returns [`AmountError::OutOfRange`] if the result does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AmountError> {
    amount
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))
        .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|value| value.to_i64())
        .ok_or(AmountError::OutOfRange(amount))
}

/// Convert minor units back into a major-unit decimal with two places.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// A non-negative price in minor units, decoded leniently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MinorUnits(i64);

impl MinorUnits {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create from a raw minor-unit value, clamping negatives to zero.
    pub fn new(minor: i64) -> Self {
        Self(minor.max(0))
    }

    /// Create from a major-unit decimal.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or out of range.
    pub fn from_major(amount: Decimal) -> Result<Self, AmountError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(AmountError::Negative(amount));
        }

        to_minor_units(amount).map(Self)
    }

    /// Raw minor-unit value.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Major-unit decimal value.
    pub fn to_major(self) -> Decimal {
        from_minor_units(self.0)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl<'de> Deserialize<'de> for MinorUnits {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = lenient_decimal(deserializer)?;

        Self::from_major(amount).map_err(de::Error::custom)
    }
}

/// A non-negative whole number of minutes, decoded leniently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Minutes(u32);

impl Minutes {
    /// Create from a whole number of minutes.
    pub fn new(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Raw minute count.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Minutes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = lenient_decimal(deserializer)?;

        if value.is_sign_negative() && !value.is_zero() {
            return Err(de::Error::custom(AmountError::Negative(value)));
        }

        value
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .map(Self)
            .ok_or_else(|| de::Error::custom(AmountError::OutOfRange(value)))
    }
}

/// Deserialize a decimal from a number, a numeric string, `null` or nothing.
///
/// Use with `#[serde(default, deserialize_with = "...")]` so that absent fields
/// also decode to zero.
///
/// # Errors
///
/// Fails when the value is text that is not a number.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;

    match raw {
        None => Ok(Decimal::ZERO),
        Some(raw) => raw.into_decimal().map_err(de::Error::custom),
    }
}
