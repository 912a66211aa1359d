//! Decoders for the integer temporal encodings used by CDC producers.
//!
//! - DATE: days since the epoch (`i32` on the wire, accepted as `i64`)
//! - TIME: milliseconds since midnight
//! - DATETIME / TIMESTAMP: milliseconds since the epoch
//! - DATETIME(6): microseconds since the epoch
//!
//! Every decoder is checked: values that fall outside chrono's calendar range
//! return [`TemporalError::OutOfRange`] instead of wrapping.

use crate::epoch::{epoch_date, epoch_datetime};
use crate::error::TemporalError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_SECOND: i64 = 1_000;

/// Decode a days-since-epoch DATE encoding.
pub fn days_to_date(days: i64) -> Result<NaiveDate, TemporalError> {
    TimeDelta::try_days(days)
        .and_then(|delta| epoch_date().checked_add_signed(delta))
        .ok_or(TemporalError::OutOfRange {
            unit: "days",
            value: days,
        })
}

/// Decode a milliseconds-since-midnight TIME encoding.
///
/// The sub-second remainder is kept as the fractional part of the result, so
/// `millis_to_time(3_723_456)` is `01:02:03.456`.
pub fn millis_to_time(millis: i64) -> Result<NaiveTime, TemporalError> {
    if millis < 0 {
        return Err(TemporalError::NotTimeOfDay { millis });
    }

    let hours = millis / MILLIS_PER_HOUR;
    let rest = millis % MILLIS_PER_HOUR;
    let minutes = rest / MILLIS_PER_MINUTE;
    let rest = rest % MILLIS_PER_MINUTE;
    let seconds = rest / MILLIS_PER_SECOND;
    let fraction = rest % MILLIS_PER_SECOND;

    if hours >= 24 {
        return Err(TemporalError::NotTimeOfDay { millis });
    }

    // All components are bounded above, the casts cannot truncate.
    NaiveTime::from_hms_milli_opt(
        hours as u32,
        minutes as u32,
        seconds as u32,
        fraction as u32,
    )
    .ok_or(TemporalError::NotTimeOfDay { millis })
}

/// Decode a milliseconds-since-epoch DATETIME / TIMESTAMP encoding.
pub fn millis_to_datetime(millis: i64) -> Result<NaiveDateTime, TemporalError> {
    TimeDelta::try_milliseconds(millis)
        .and_then(|delta| epoch_datetime().checked_add_signed(delta))
        .ok_or(TemporalError::OutOfRange {
            unit: "milliseconds",
            value: millis,
        })
}

/// Decode a microseconds-since-epoch DATETIME(6) encoding.
pub fn micros_to_datetime(micros: i64) -> Result<NaiveDateTime, TemporalError> {
    epoch_datetime()
        .checked_add_signed(TimeDelta::microseconds(micros))
        .ok_or(TemporalError::OutOfRange {
            unit: "microseconds",
            value: micros,
        })
}

/// Parse the ISO-8601 UTC strings some producers emit for timestamps,
/// e.g. `2024-01-15T10:30:00Z` or `2024-01-15T10:30:00.250Z`.
pub fn parse_timestamp_str(input: &str) -> Result<NaiveDateTime, TemporalError> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ"];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| TemporalError::Unparseable {
            input: input.to_string(),
        })
}
