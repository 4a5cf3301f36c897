use chrono::{Duration, NaiveDate, NaiveTime, SecondsFormat, Timelike};
use serde::Serialize;
use thiserror::Error;

use crate::timezone;

pub const DEFAULT_SET_MINUTES: i64 = 90;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid event date: {0:?}")]
    InvalidDate(String),
    #[error("invalid set-time: {0:?}")]
    InvalidSetTime(String),
}

#[derive(Debug, Clone, Copy)]
pub struct InstantOptions {
    pub set_duration: Duration,
    /// Move the end date forward when the last set runs past midnight.
    /// Off by default: the end keeps the event's calendar date.
    pub roll_end_past_midnight: bool,
}

impl Default for InstantOptions {
    fn default() -> Self {
        Self {
            set_duration: Duration::minutes(DEFAULT_SET_MINUTES),
            roll_end_past_midnight: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventInstants {
    pub start: String,
    pub end: Option<String>,
}

/// Accepts `YYYY-MM-DD`, or any longer ISO timestamp whose first ten
/// characters are one.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(raw.to_string()))
}

pub fn parse_set_time(raw: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ScheduleError::InvalidSetTime(raw.to_string()))
}

fn present_set_times(set_times: &[String]) -> Vec<&str> {
    set_times
        .iter()
        .map(|time| time.trim())
        .filter(|time| !time.is_empty())
        .collect()
}

/// ISO-8601 start/end for an event's structured data.
///
/// With set-times the start is the first set and the end is the last set
/// plus the set duration, both stamped with the Eastern offset for the
/// date. Without set-times the start is midnight in New York and there is
/// no end.
pub fn event_instants(
    date: &str,
    set_times: &[String],
    options: &InstantOptions,
) -> Result<EventInstants, ScheduleError> {
    let day = parse_event_date(date)?;
    let times = present_set_times(set_times);

    let (first, last) = match (times.first(), times.last()) {
        (Some(first), Some(last)) => (parse_set_time(first)?, parse_set_time(last)?),
        _ => {
            return Ok(EventInstants {
                start: timezone::eastern_midnight(day).to_rfc3339_opts(SecondsFormat::Secs, false),
                end: None,
            })
        }
    };

    let start = stamp(day, first, timezone::utc_offset(day));

    let (end_time, wrapped_secs) = last.overflowing_add_signed(options.set_duration);
    let end_day = if options.roll_end_past_midnight && wrapped_secs != 0 {
        day.checked_add_signed(Duration::seconds(wrapped_secs))
            .ok_or_else(|| ScheduleError::InvalidDate(date.to_string()))?
    } else {
        day
    };
    let end = stamp(end_day, end_time, timezone::utc_offset(end_day));

    Ok(EventInstants {
        start,
        end: Some(end),
    })
}

fn stamp(day: NaiveDate, time: NaiveTime, offset: &str) -> String {
    format!(
        "{}T{:02}:{:02}:00{}",
        day.format("%Y-%m-%d"),
        time.hour(),
        time.minute(),
        offset
    )
}

/// `Thursday, July 4, 2024`; the raw string when it isn't a date.
pub fn format_long_date(raw: &str) -> String {
    match parse_event_date(raw) {
        Ok(day) => day.format("%A, %B %-d, %Y").to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

/// `Thu, Jul 4`
pub fn format_short_date(raw: &str) -> String {
    match parse_event_date(raw) {
        Ok(day) => day.format("%a, %b %-d").to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

pub fn format_set_time(raw: &str) -> String {
    match parse_set_time(raw) {
        Ok(time) => time.format("%-I:%M %p").to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

/// `8:00 PM & 9:30 PM`, or `None` when nothing is scheduled.
pub fn display_set_times(set_times: &[String]) -> Option<String> {
    let times = present_set_times(set_times);
    if times.is_empty() {
        return None;
    }
    Some(
        times
            .into_iter()
            .map(format_set_time)
            .collect::<Vec<_>>()
            .join(" & "),
    )
}
