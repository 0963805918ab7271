//! Calendar-filled multi-series time-series for charting.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::format::{day_key, days_in_range};

/// Colors handed to users in first-seen order when charting all users.
pub const USER_PALETTE: [&str; 10] = [
    "#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6", "#EC4899", "#06B6D4", "#F97316",
    "#6366F1", "#14B8A6",
];

/// How entries are split into series. Resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesMode {
    /// One series per user with activity in range.
    ByUser,
    /// One series per category, for a single user.
    ByCategory { user_id: String },
}

impl SeriesMode {
    /// `None`, an empty value, or `all` select [`SeriesMode::ByUser`].
    pub fn from_user_param(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim) {
            None | Some("") | Some("all") => SeriesMode::ByUser,
            Some(id) => SeriesMode::ByCategory {
                user_id: id.to_string(),
            },
        }
    }

    /// The user the query must be restricted to, if any.
    pub fn user_scope(&self) -> Option<&str> {
        match self {
            SeriesMode::ByUser => None,
            SeriesMode::ByCategory { user_id } => Some(user_id),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesMode::ByUser => "user",
            SeriesMode::ByCategory { .. } => "category",
        }
    }

    fn key_of<'a>(&self, row: &'a SeriesRow) -> &'a str {
        match self {
            SeriesMode::ByUser => &row.user_id,
            SeriesMode::ByCategory { .. } => &row.category_id,
        }
    }
}

/// A single ledger entry as seen by the time-series builder.
#[derive(Debug, Clone)]
pub struct SeriesRow {
    pub start_time: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub category_id: String,
    pub category_name: String,
    pub category_color: String,
    pub duration: i64,
}

/// One chart series.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// User id or category id, depending on the mode.
    pub key: String,
    pub label: String,
    pub color: String,
}

/// The resolved mode with its series in first-appearance order.
#[derive(Debug, Clone)]
pub struct SeriesPlan {
    pub mode: SeriesMode,
    pub series: Vec<Series>,
}

impl SeriesPlan {
    /// Collect series from rows in scan order.
    pub fn from_rows(mode: SeriesMode, rows: &[SeriesRow]) -> Self {
        let mut series: Vec<Series> = Vec::new();
        for row in rows {
            let key = mode.key_of(row);
            if series.iter().any(|s| s.key == key) {
                continue;
            }
            let (label, color) = match &mode {
                SeriesMode::ByUser => (
                    row.user_name.clone(),
                    USER_PALETTE[series.len() % USER_PALETTE.len()].to_string(),
                ),
                SeriesMode::ByCategory { .. } => {
                    (row.category_name.clone(), row.category_color.clone())
                }
            };
            series.push(Series {
                key: key.to_string(),
                label,
                color,
            });
        }
        Self { mode, series }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.key.as_str())
    }

    pub fn color_for(&self, key: &str) -> Option<&str> {
        self.series
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.color.as_str())
    }
}

/// Totals for one calendar day, one value per series key.
#[derive(Debug, Clone, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: IndexMap<String, i64>,
}

/// Chart-ready output: every day in range, every series on every day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub group_by: &'static str,
    pub days: Vec<DayPoint>,
    pub series: Vec<Series>,
}

/// Bucket rows by local start date over `[start, end)` and fill the gaps.
///
/// `rows` must be in ascending start order; series order follows first
/// appearance in that scan. Rows dated outside the window are ignored.
pub fn build_timeseries(
    mode: SeriesMode,
    rows: &[SeriesRow],
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
) -> TimeSeries {
    let plan = SeriesPlan::from_rows(mode, rows);

    let mut days: Vec<DayPoint> = days_in_range(start, end)
        .into_iter()
        .map(|date| DayPoint {
            date,
            values: plan.keys().map(|k| (k.to_string(), 0)).collect(),
        })
        .collect();

    for row in rows {
        let date = day_key(row.start_time, offset);
        let Some(index) = date.signed_duration_since(start).num_days().try_into().ok() else {
            continue;
        };
        let Some(point) = days.get_mut::<usize>(index) else {
            continue;
        };
        if let Some(total) = point.values.get_mut(plan.mode.key_of(row)) {
            *total += row.duration;
        }
    }

    TimeSeries {
        group_by: plan.mode.as_str(),
        days,
        series: plan.series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(start: &str, user: &str, category: &str, duration: i64) -> SeriesRow {
        SeriesRow {
            start_time: start.parse().unwrap(),
            user_id: user.to_string(),
            user_name: format!("{} name", user),
            category_id: category.to_string(),
            category_name: category.to_uppercase(),
            category_color: format!("#{}", category),
            duration,
        }
    }

    fn zero() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_mode_from_param() {
        assert_eq!(SeriesMode::from_user_param(None), SeriesMode::ByUser);
        assert_eq!(SeriesMode::from_user_param(Some("all")), SeriesMode::ByUser);
        assert_eq!(
            SeriesMode::from_user_param(Some("u7")),
            SeriesMode::ByCategory {
                user_id: "u7".to_string()
            }
        );
        assert_eq!(SeriesMode::ByUser.user_scope(), None);
    }

    #[test]
    fn test_three_day_range_with_activity_on_day_two() {
        let rows = vec![row("2026-05-05T10:00:00Z", "u1", "dev", 1800)];
        let ts = build_timeseries(
            SeriesMode::ByUser,
            &rows,
            date("2026-05-04"),
            date("2026-05-07"),
            zero(),
        );

        assert_eq!(ts.days.len(), 3);
        let values: Vec<i64> = ts.days.iter().map(|d| d.values["u1"]).collect();
        assert_eq!(values, vec![0, 1800, 0]);
        assert_eq!(ts.series.len(), 1);
        assert_eq!(ts.series[0].label, "u1 name");
        assert_eq!(ts.group_by, "user");
    }

    #[test]
    fn test_every_key_present_every_day() {
        let rows = vec![
            row("2026-05-04T09:00:00Z", "u2", "dev", 100),
            row("2026-05-05T09:00:00Z", "u1", "dev", 200),
            row("2026-05-05T11:00:00Z", "u2", "meet", 50),
        ];
        let ts = build_timeseries(
            SeriesMode::ByUser,
            &rows,
            date("2026-05-04"),
            date("2026-05-06"),
            zero(),
        );

        let keys: Vec<&str> = ts.series.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["u2", "u1"]);
        for day in &ts.days {
            assert_eq!(day.values.len(), 2);
        }
        assert_eq!(ts.days[0].values["u2"], 100);
        assert_eq!(ts.days[0].values["u1"], 0);
        assert_eq!(ts.days[1].values["u2"], 50);
        assert_eq!(ts.days[1].values["u1"], 200);
    }

    #[test]
    fn test_user_colors_cycle_through_palette() {
        let rows: Vec<SeriesRow> = (0..12)
            .map(|i| row("2026-05-04T09:00:00Z", &format!("u{}", i), "dev", 10))
            .collect();
        let plan = SeriesPlan::from_rows(SeriesMode::ByUser, &rows);

        assert_eq!(plan.series.len(), 12);
        assert_eq!(plan.color_for("u0"), Some(USER_PALETTE[0]));
        assert_eq!(plan.color_for("u9"), Some(USER_PALETTE[9]));
        assert_eq!(plan.color_for("u10"), Some(USER_PALETTE[0]));
        assert_eq!(plan.color_for("u11"), Some(USER_PALETTE[1]));
        assert_eq!(plan.color_for("nobody"), None);
    }

    #[test]
    fn test_category_mode_uses_category_colors() {
        let rows = vec![
            row("2026-05-04T09:00:00Z", "u1", "meet", 60),
            row("2026-05-04T10:00:00Z", "u1", "dev", 120),
            row("2026-05-04T11:00:00Z", "u1", "meet", 30),
        ];
        let mode = SeriesMode::from_user_param(Some("u1"));
        let ts = build_timeseries(mode, &rows, date("2026-05-04"), date("2026-05-05"), zero());

        assert_eq!(ts.group_by, "category");
        assert_eq!(
            ts.series,
            vec![
                Series {
                    key: "meet".into(),
                    label: "MEET".into(),
                    color: "#meet".into()
                },
                Series {
                    key: "dev".into(),
                    label: "DEV".into(),
                    color: "#dev".into()
                },
            ]
        );
        assert_eq!(ts.days[0].values["meet"], 90);
        assert_eq!(ts.days[0].values["dev"], 120);
    }

    #[test]
    fn test_buckets_by_local_date() {
        // 23:30 UTC on the 4th is the 5th at UTC+01:00.
        let rows = vec![row("2026-05-04T23:30:00Z", "u1", "dev", 60)];
        let offset = FixedOffset::east_opt(3600).unwrap();
        let ts = build_timeseries(
            SeriesMode::ByUser,
            &rows,
            date("2026-05-04"),
            date("2026-05-06"),
            offset,
        );
        assert_eq!(ts.days[0].values["u1"], 0);
        assert_eq!(ts.days[1].values["u1"], 60);
    }

    #[test]
    fn test_empty_range_data_still_lists_days() {
        let ts = build_timeseries(
            SeriesMode::ByUser,
            &[],
            date("2026-05-01"),
            date("2026-05-08"),
            zero(),
        );
        assert_eq!(ts.days.len(), 7);
        assert!(ts.series.is_empty());
        assert_eq!(ts.days[0].date, date("2026-05-01"));
        assert_eq!(ts.days[6].date, date("2026-05-07"));

        let json = serde_json::to_value(&ts.days[0]).unwrap();
        assert_eq!(json["date"], "2026-05-01");
    }
}
