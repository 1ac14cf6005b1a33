//! Semantic type conversion helpers.
//!
//! Every helper takes the name of the column it is converting so that a
//! failure can be reported as [`Error::MalformedField`] for that column.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::price::Price;

/// Calendar date layout of `trade_dt`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse layout of `event_tm` / `arrival_tm` (fraction consumed with its dot).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Output layout of timestamps, always microsecond precision.
pub const TIMESTAMP_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Maximum fractional-second digits accepted on input.
const MAX_FRACTION_DIGITS: usize = 6;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| Error::malformed(field, format!("invalid date {raw:?}: {e}")))
}

/// Parse a `YYYY-MM-DD HH:MM:SS.ffffff` timestamp.
///
/// The fractional part is mandatory and carries one to six digits.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<NaiveDateTime> {
    let fraction = raw
        .rsplit_once('.')
        .map(|(_, frac)| frac)
        .ok_or_else(|| Error::malformed(field, format!("timestamp {raw:?} has no fractional seconds")))?;

    if fraction.is_empty()
        || fraction.len() > MAX_FRACTION_DIGITS
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::malformed(
            field,
            format!("timestamp {raw:?} must end in 1 to {MAX_FRACTION_DIGITS} fractional digits"),
        ));
    }

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| Error::malformed(field, format!("invalid timestamp {raw:?}: {e}")))
}

/// Parse a 32-bit signed integer, ignoring surrounding whitespace.
pub fn parse_int(field: &'static str, raw: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|e| Error::malformed(field, format!("invalid integer {raw:?}: {e}")))
}

/// Parse a fixed-point price that fits `decimal(30,15)` without rounding.
///
/// Trailing fractional zeros do not count against the scale. Values that
/// would need rounding are rejected instead of truncated.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Price> {
    raw.trim()
        .parse::<Price>()
        .map_err(|e| Error::malformed(field, format!("invalid decimal {raw:?}: {e}")))
}
