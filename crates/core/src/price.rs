//! Fixed-point price matching the `decimal(30,15)` column type.
//!
//! A price is stored as a signed count of 10^-15 units. Thirty digits fit in
//! an `i128` with room to spare, so every value of the column type is exact.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Total digits of a price.
pub const PRICE_PRECISION: u32 = 30;

/// Fractional digits of a price.
pub const PRICE_SCALE: u32 = 15;

const UNITS_PER_ONE: i128 = 10i128.pow(PRICE_SCALE);

/// Exclusive bound on the absolute number of units.
const MAX_UNITS: i128 = 10i128.pow(PRICE_PRECISION);

/// Largest decimal exponent accepted in scientific notation.
const MAX_EXPONENT: u32 = 64;

/// Why a price string could not be represented exactly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsePriceError {
    #[error("not a decimal number")]
    Invalid,
    #[error("more than {} fractional digits", PRICE_SCALE)]
    TooManyFractionDigits,
    #[error("more than {} integer digits", PRICE_PRECISION - PRICE_SCALE)]
    TooManyIntegerDigits,
}

/// Exact `decimal(30,15)` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i128);

impl Price {
    /// Price of zero.
    pub const ZERO: Price = Price(0);

    /// Build from a count of 10^-15 units. Returns `None` outside 30 digits.
    pub fn from_units(units: i128) -> Option<Self> {
        (units.unsigned_abs() < MAX_UNITS as u128).then_some(Price(units))
    }

    /// Count of 10^-15 units.
    pub fn units(self) -> i128 {
        self.0
    }

    /// Integer value, when the price has no fractional part.
    pub fn to_integer(self) -> Option<i128> {
        (self.0 % UNITS_PER_ONE == 0).then(|| self.0 / UNITS_PER_ONE)
    }
}

impl FromStr for Price {
    type Err = ParsePriceError;

    /// Accepts `[+-]digits[.digits][e[+-]digits]`; values are never rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => {
                let exp = &unsigned[pos + 1..];
                let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
                if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ParsePriceError::Invalid);
                }
                let exp: i32 = exp.parse().map_err(|_| ParsePriceError::Invalid)?;
                if exp.unsigned_abs() > MAX_EXPONENT {
                    return Err(if exp > 0 {
                        ParsePriceError::TooManyIntegerDigits
                    } else {
                        ParsePriceError::TooManyFractionDigits
                    });
                }
                (&unsigned[..pos], exp)
            }
            None => (unsigned, 0),
        };

        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
            return Err(ParsePriceError::Invalid);
        }

        // value = digits * 10^exponent
        let digits = format!("{int_part}{frac_part}");
        let mut exponent = exponent - frac_part.len() as i32;
        let digits = digits.trim_start_matches('0');
        let trimmed = digits.trim_end_matches('0');
        exponent += (digits.len() - trimmed.len()) as i32;

        if trimmed.is_empty() {
            return Ok(Price::ZERO);
        }
        if exponent < -(PRICE_SCALE as i32) {
            return Err(ParsePriceError::TooManyFractionDigits);
        }
        if trimmed.len() as i32 + exponent > (PRICE_PRECISION - PRICE_SCALE) as i32 {
            return Err(ParsePriceError::TooManyIntegerDigits);
        }

        // At most 30 digits once shifted to units, which fits an i128.
        let mut units: i128 = trimmed.parse().map_err(|_| ParsePriceError::Invalid)?;
        units *= 10i128.pow((exponent + PRICE_SCALE as i32) as u32);
        Ok(Price(if negative { -units } else { units }))
    }
}

impl fmt::Display for Price {
    /// Shortest exact form: no trailing fractional zeros, no trailing dot.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let int_part = abs / UNITS_PER_ONE as u128;
        let frac_part = abs % UNITS_PER_ONE as u128;
        let sign = if self.0 < 0 { "-" } else { "" };
        if frac_part == 0 {
            write!(f, "{sign}{int_part}")
        } else {
            let frac = format!("{frac_part:015}");
            write!(f, "{sign}{int_part}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
