//! Time entry and active timer models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed (or manually recorded) work interval.
///
/// `duration` is authoritative and is what every aggregation sums; it need not
/// equal `end_time - start_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub tag_id: Option<String>,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: i64,
}

/// A time entry joined with user, category and tag display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    #[serde(flatten)]
    pub entry: TimeEntry,
    pub user_name: String,
    pub user_email: String,
    pub category_name: String,
    pub category_color: String,
    pub tag_name: Option<String>,
    pub tag_color: Option<String>,
}

/// Request body for creating a time entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration: i64,
}

/// Request body for editing a time entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub category_id: Option<String>,
    /// `Some(None)` clears the tag, `None` keeps it.
    #[serde(default, deserialize_with = "double_option")]
    pub tag_id: Option<Option<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub duration: Option<i64>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The single "currently running" record of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub tag_id: Option<String>,
    pub description: String,
    pub start_time: DateTime<Utc>,
}

/// An active timer with the caller-relative elapsed time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimerStatus {
    #[serde(flatten)]
    pub timer: ActiveTimer,
    pub elapsed_seconds: i64,
}

/// An active timer joined with display metadata, for the "who's clocked in" view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamActiveTimer {
    #[serde(flatten)]
    pub timer: ActiveTimer,
    pub user_name: String,
    pub user_email: String,
    pub category_name: String,
    pub category_color: String,
    pub tag_name: Option<String>,
    pub tag_color: Option<String>,
    pub elapsed_seconds: i64,
    pub elapsed_display: String,
}

/// Request body for starting a timer. Omitted `start_time` means "now".
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTimerRequest {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

/// Request body for updating the running timer's labels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimerRequest {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for stopping the running timer and recording it.
///
/// `duration` carries the client's own elapsed seconds when it paused locally.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTimerRequest {
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_entry_distinguishes_cleared_tag() {
        let cleared: UpdateEntryRequest = serde_json::from_str(r#"{"tagId": null}"#).unwrap();
        assert_eq!(cleared.tag_id, Some(None));

        let untouched: UpdateEntryRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(untouched.tag_id, None);
    }

    #[test]
    fn test_team_entry_serializes_flat() {
        let entry = TeamEntry {
            entry: TimeEntry {
                id: "e1".into(),
                user_id: "u1".into(),
                category_id: "c1".into(),
                tag_id: None,
                description: "Review".into(),
                start_time: "2026-01-05T09:00:00Z".parse().unwrap(),
                end_time: None,
                duration: 60,
            },
            user_name: "Ada".into(),
            user_email: "ada@example.com".into(),
            category_name: "Development".into(),
            category_color: "#ffffff".into(),
            tag_name: None,
            tag_color: None,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], "e1");
        assert_eq!(value["userName"], "Ada");
        assert_eq!(value["duration"], 60);
    }
}
