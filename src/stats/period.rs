//! Named reporting periods and explicit date windows.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::format::{day_key, start_of_day};

/// Longest window the time-series endpoint accepts, in days.
pub const MAX_WINDOW_DAYS: i64 = 732;

/// A named rollup period ending now.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    All,
}

impl Period {
    /// Parse a period name. Missing or unknown names mean [`Period::Week`].
    pub fn parse(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("month") => Period::Month,
            Some("all") => Period::All,
            _ => Period::Week,
        }
    }

    /// First instant included in the period.
    ///
    /// `week` starts on the most recent local Monday (today when today is
    /// Monday), `month` on the first of the current local month.
    pub fn lower_bound(&self, now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
        let today = day_key(now, offset);
        match self {
            Period::Week => {
                let back = i64::from(today.weekday().num_days_from_monday());
                start_of_day(today - Duration::days(back), offset)
            }
            Period::Month => {
                let first = today.with_day(1).unwrap_or(today);
                start_of_day(first, offset)
            }
            Period::All => DateTime::UNIX_EPOCH,
        }
    }
}

/// Parse the required `[startDate, endDate)` window of the time-series endpoint.
///
/// Both bounds are required; there is no default window.
pub fn parse_window(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let (Some(start), Some(end)) = (
        start.map(str::trim).filter(|s| !s.is_empty()),
        end.map(str::trim).filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "startDate and endDate are required".to_string(),
        ));
    };

    let start = parse_date(start, "startDate")?;
    let end = parse_date(end, "endDate")?;

    if end <= start {
        return Err(AppError::Validation(
            "endDate must be after startDate".to_string(),
        ));
    }
    if (end - start).num_days() > MAX_WINDOW_DAYS {
        return Err(AppError::Validation(format!(
            "Date window must not exceed {} days",
            MAX_WINDOW_DAYS
        )));
    }

    Ok((start, end))
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    // Accept full timestamps too; only the date part matters.
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn zero() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_unknown_period_falls_back_to_week() {
        assert_eq!(Period::parse(None), Period::Week);
        assert_eq!(Period::parse(Some("quarter")), Period::Week);
        assert_eq!(Period::parse(Some("month")), Period::Month);
        assert_eq!(Period::parse(Some("all")), Period::All);
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2026-05-07 is a Thursday.
        let now = utc("2026-05-07T15:30:00Z");
        assert_eq!(
            Period::Week.lower_bound(now, zero()),
            utc("2026-05-04T00:00:00Z")
        );
    }

    #[test]
    fn test_week_on_monday_and_sunday() {
        let monday = utc("2026-05-04T00:10:00Z");
        assert_eq!(
            Period::Week.lower_bound(monday, zero()),
            utc("2026-05-04T00:00:00Z")
        );
        let sunday = utc("2026-05-10T23:59:00Z");
        assert_eq!(
            Period::Week.lower_bound(sunday, zero()),
            utc("2026-05-04T00:00:00Z")
        );
    }

    #[test]
    fn test_week_uses_local_calendar() {
        // Sunday 23:30 UTC is already Monday at UTC+02:00.
        let now = utc("2026-05-10T23:30:00Z");
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            Period::Week.lower_bound(now, offset),
            utc("2026-05-10T22:00:00Z")
        );
    }

    #[test]
    fn test_month_and_all() {
        let now = utc("2026-05-07T15:30:00Z");
        assert_eq!(
            Period::Month.lower_bound(now, zero()),
            utc("2026-05-01T00:00:00Z")
        );
        assert_eq!(
            Period::All.lower_bound(now, zero()),
            utc("1970-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_window_requires_both_bounds() {
        assert!(matches!(
            parse_window(Some("2026-05-01"), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_window(None, Some("2026-05-01")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_window(Some(""), Some("2026-05-01")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_window_rejects_bad_input() {
        assert!(parse_window(Some("yesterday"), Some("2026-05-01")).is_err());
        assert!(parse_window(Some("2026-05-03"), Some("2026-05-01")).is_err());
        assert!(parse_window(Some("2020-01-01"), Some("2026-01-01")).is_err());
    }

    #[test]
    fn test_window_accepts_dates_and_timestamps() {
        let (start, end) =
            parse_window(Some("2026-05-01"), Some("2026-05-04T00:00:00.000Z")).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 5, 4).unwrap());
    }
}
