//! Reference points for the numeric CDC encodings.
//!
//! Date columns arrive as days since [`epoch_date`], time-of-day columns as
//! milliseconds since midnight, and date-time columns as milliseconds or
//! microseconds since [`epoch_datetime`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Calendar year of the reference epoch.
pub const EPOCH_YEAR: i32 = 1970;

/// 1970-01-01.
pub fn epoch_date() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

/// 1970-01-01T00:00:00, without an offset.
pub fn epoch_datetime() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}
