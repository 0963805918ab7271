//! Duration and calendar-day formatting.
//!
//! Every function here is pure. Day boundaries are computed in a caller-supplied
//! [`FixedOffset`] so period cutoffs, filters and chart buckets agree on what
//! "a day" is.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Format elapsed seconds as a running clock, `HH:MM:SS`.
///
/// Hours are not wrapped at 24. Negative input is shown as zero.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format a total as a compact human string: `2h 5m`, `45m`, `30s`.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Calendar date of a timestamp in local time.
pub fn day_key(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// Local midnight at the start of `date`, as a UTC instant.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    local_to_utc(date, NaiveTime::MIN, offset)
}

/// Last millisecond of `date` (23:59:59.999 local), as a UTC instant.
pub fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    start_of_day(date, offset) + Duration::days(1) - Duration::milliseconds(1)
}

fn local_to_utc(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    // A fixed offset has no gaps or folds, so the mapping is always single.
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(time)))
}

/// Every calendar day in `[start, end)`, ascending. Empty when `end <= start`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d < end).collect()
}

/// Fixed-width UTC text used for storage: `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Lexical order of these strings equals chronological order.
pub fn to_storage(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(125), "00:02:05");
        assert_eq!(format_clock(3 * 3600 + 7), "03:00:07");
        assert_eq!(format_clock(100 * 3600), "100:00:00");
        assert_eq!(format_clock(-30), "00:00:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(45 * 60 + 10), "45m");
        assert_eq!(format_duration(2 * 3600 + 5 * 60), "2h 5m");
        assert_eq!(format_duration(-5), "0s");
    }

    #[test]
    fn test_day_key_uses_local_offset() {
        let ts = utc("2026-03-01T23:30:00Z");
        assert_eq!(day_key(ts, FixedOffset::east_opt(0).unwrap()), date("2026-03-01"));
        assert_eq!(
            day_key(ts, FixedOffset::east_opt(3600).unwrap()),
            date("2026-03-02")
        );
        assert_eq!(
            day_key(ts, FixedOffset::west_opt(5 * 3600).unwrap()),
            date("2026-03-01")
        );
    }

    #[test]
    fn test_day_bounds() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let day = date("2026-06-10");
        assert_eq!(start_of_day(day, offset), utc("2026-06-09T22:00:00Z"));
        assert_eq!(end_of_day(day, offset), utc("2026-06-10T21:59:59.999Z"));
    }

    #[test]
    fn test_days_in_range_is_end_exclusive() {
        let days = days_in_range(date("2026-02-27"), date("2026-03-02"));
        assert_eq!(
            days,
            vec![date("2026-02-27"), date("2026-02-28"), date("2026-03-01")]
        );
        assert!(days_in_range(date("2026-03-02"), date("2026-03-02")).is_empty());
    }

    #[test]
    fn test_storage_format_is_fixed_width() {
        assert_eq!(
            to_storage(utc("2026-01-05T09:00:00Z")),
            "2026-01-05T09:00:00.000Z"
        );
        assert_eq!(
            to_storage(utc("2026-01-05T09:00:00.5Z")),
            "2026-01-05T09:00:00.500Z"
        );
    }
}
