//! Timestamp parsing for the time-of-day analysis.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

use crate::types::TimeOfDay;

/// Format of the catalog's creation timestamp, e.g. `01.01.2025, 07:00:00`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

/// Time fields derived from one creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFields {
    pub weekday: Weekday,
    pub hour: u32,
    pub time_of_day: TimeOfDay,
}

/// Parse `value` with `format`. Unparsable input yields `None`.
pub fn parse_timestamp(value: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), format).ok()
}

/// Weekday, hour and bucket of a timestamp string, `None` when it does not parse.
pub fn time_fields(value: Option<&str>, format: &str) -> Option<TimeFields> {
    let timestamp = parse_timestamp(value?, format)?;
    let hour = timestamp.hour();
    Some(TimeFields {
        weekday: timestamp.weekday(),
        hour,
        time_of_day: TimeOfDay::from_hour(hour),
    })
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
