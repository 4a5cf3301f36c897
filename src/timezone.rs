//! US Eastern offset resolution for structured-data timestamps.
//!
//! Daylight time is detected by comparing a date's offset at local midnight
//! with the offset on January 1st of the same year. The comparison runs
//! against the tz database entry for New York, never the host zone.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

pub const EASTERN: Tz = chrono_tz::America::New_York;

pub const STANDARD_OFFSET: &str = "-05:00";
pub const DAYLIGHT_OFFSET: &str = "-04:00";

pub fn is_daylight_time(date: NaiveDate) -> bool {
    let january_first = date.with_ordinal(1).unwrap_or(date);
    midnight_offset_seconds(date) != midnight_offset_seconds(january_first)
}

/// Fixed offset string for `date`, one of [`STANDARD_OFFSET`] / [`DAYLIGHT_OFFSET`].
pub fn utc_offset(date: NaiveDate) -> &'static str {
    if is_daylight_time(date) {
        DAYLIGHT_OFFSET
    } else {
        STANDARD_OFFSET
    }
}

/// Start of `date` in New York. A skipped midnight resolves to the instant
/// that midnight names in UTC.
pub fn eastern_midnight(date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    match EASTERN.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => EASTERN.from_utc_datetime(&midnight),
    }
}

fn midnight_offset_seconds(date: NaiveDate) -> i32 {
    eastern_midnight(date).offset().fix().local_minus_utc()
}
