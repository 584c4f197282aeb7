//! Timestamp Normalization
//!
//! Converts raw epoch timestamps into absolute UTC instants and localizes
//! them into a venue time zone.
//!
//! Nanosecond timestamps are truncated to millisecond resolution. Ticks are
//! stored with millisecond precision downstream, so both API versions map
//! the same trade to the same instant.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::domain::trades::TimestampUnit;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// A raw timestamp that cannot be represented as a `DateTime<Utc>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timestamp {raw} ({unit:?}) is out of range")]
pub struct TimestampOutOfRange {
    /// Offending raw value.
    pub raw: i64,
    /// Unit it was given in.
    pub unit: TimestampUnit,
}

/// Epoch milliseconds for a raw timestamp.
///
/// Nanoseconds are floored to whole milliseconds.
#[must_use]
pub const fn to_epoch_millis(raw: i64, unit: TimestampUnit) -> i64 {
    match unit {
        TimestampUnit::Milliseconds => raw,
        TimestampUnit::Nanoseconds => raw.div_euclid(NANOS_PER_MILLI),
    }
}

/// Absolute instant for a raw timestamp.
///
/// # Errors
///
/// Returns an error if the value falls outside chrono's supported range.
pub fn to_instant(raw: i64, unit: TimestampUnit) -> Result<DateTime<Utc>, TimestampOutOfRange> {
    DateTime::from_timestamp_millis(to_epoch_millis(raw, unit))
        .ok_or(TimestampOutOfRange { raw, unit })
}

/// Venue-local time for an instant.
#[must_use]
pub fn localize(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    tz.from_utc_datetime(&instant.naive_utc())
}
