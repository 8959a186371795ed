//! Wire formats for dates and times.
//!
//! Schedules are authored in the child's local wall-clock frame, so intake
//! instants are naive local timestamps; audit timestamps are UTC.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| anyhow!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Accepts `HH:MM` and `HH:MM:SS`
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| anyhow!("Invalid time '{}', expected HH:MM", value))
}

/// Accepts a naive local timestamp, or an RFC 3339 instant converted to local time
pub fn parse_local_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| anyhow!("Invalid timestamp '{}', expected YYYY-MM-DDTHH:MM:SS", value))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_local_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(LOCAL_TIMESTAMP_FORMAT).to_string()
}

pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

/// Current wall-clock time in the local frame, truncated to whole seconds
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_accepts_short_and_long_forms() {
        assert_eq!(parse_time("08:30").unwrap(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(parse_time("21:05:10").unwrap(), NaiveTime::from_hms_opt(21, 5, 10).unwrap());
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn test_parse_local_timestamp_naive_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(parse_local_timestamp("2024-03-06T08:00:00").unwrap(), expected);
        assert_eq!(parse_local_timestamp("2024-03-06T08:00").unwrap(), expected);
        assert_eq!(parse_local_timestamp("2024-03-06 08:00:00").unwrap(), expected);
        assert!(parse_local_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_local_timestamp_converts_rfc3339() {
        let parsed = parse_local_timestamp("2024-03-06T08:00:00Z").unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-03-06T08:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_local_now_has_no_subseconds() {
        assert_eq!(local_now().nanosecond(), 0);
    }

    #[test]
    fn test_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(format_date(date), "2024-01-09");
        assert_eq!(
            format_local_timestamp(date.and_hms_opt(7, 5, 0).unwrap()),
            "2024-01-09T07:05:00"
        );
        assert_eq!(format_time(NaiveTime::from_hms_opt(7, 5, 0).unwrap()), "07:05:00");
    }
}
