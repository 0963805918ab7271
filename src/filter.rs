//! Predicate filtering of entry collections.
//!
//! A filter is a conjunction of optional constraints. An absent constraint (or
//! an empty string in a query) passes everything through.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use crate::format::{end_of_day, start_of_day};
use crate::models::{TeamEntry, TimeEntry};

/// Anything that can be filtered like a time entry.
pub trait Filterable {
    fn description(&self) -> &str;
    fn start_time(&self) -> DateTime<Utc>;
    fn category_id(&self) -> &str;
    fn user_id(&self) -> &str;
}

impl Filterable for TimeEntry {
    fn description(&self) -> &str {
        &self.description
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn category_id(&self) -> &str {
        &self.category_id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Filterable for TeamEntry {
    fn description(&self) -> &str {
        self.entry.description()
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.entry.start_time
    }

    fn category_id(&self) -> &str {
        self.entry.category_id()
    }

    fn user_id(&self) -> &str {
        self.entry.user_id()
    }
}

/// Filter criteria, usually taken from a query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub user_id: Option<String>,
}

impl EntryFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.category_id.is_none()
            && self.user_id.is_none()
    }

    /// Bind the date bounds to local day boundaries.
    pub fn compile(&self, offset: FixedOffset) -> CompiledFilter<'_> {
        CompiledFilter {
            search: self.search.as_deref().map(str::to_lowercase),
            from: self.start_date.map(|d| start_of_day(d, offset)),
            until: self.end_date.map(|d| end_of_day(d, offset)),
            category_id: self.category_id.as_deref(),
            user_id: self.user_id.as_deref(),
        }
    }

    /// Keep the entries that satisfy every constraint, preserving order.
    pub fn apply<T: Filterable>(&self, entries: Vec<T>, offset: FixedOffset) -> Vec<T> {
        if self.is_empty() {
            return entries;
        }
        let compiled = self.compile(offset);
        entries.into_iter().filter(|e| compiled.matches(e)).collect()
    }
}

/// An [`EntryFilter`] with bounds resolved to instants.
#[derive(Debug, Clone)]
pub struct CompiledFilter<'a> {
    search: Option<String>,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    category_id: Option<&'a str>,
    user_id: Option<&'a str>,
}

impl CompiledFilter<'_> {
    pub fn matches<T: Filterable>(&self, entry: &T) -> bool {
        if let Some(needle) = &self.search {
            if !entry.description().to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        let start = entry.start_time();
        if self.from.is_some_and(|from| start < from) {
            return false;
        }
        if self.until.is_some_and(|until| start > until) {
            return false;
        }

        if self.category_id.is_some_and(|id| entry.category_id() != id) {
            return false;
        }
        if self.user_id.is_some_and(|id| entry.user_id() != id) {
            return false;
        }

        true
    }
}

/// Treat `?field=` the same as an absent field.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, user: &str, category: &str, description: &str, start: &str) -> TimeEntry {
        TimeEntry {
            id: id.to_string(),
            user_id: user.to_string(),
            category_id: category.to_string(),
            tag_id: None,
            description: description.to_string(),
            start_time: start.parse().unwrap(),
            end_time: None,
            duration: 60,
        }
    }

    fn utc_offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn ids(entries: &[TimeEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn sample() -> Vec<TimeEntry> {
        vec![
            entry("a", "u1", "dev", "Fix login BUG", "2026-04-01T00:00:00Z"),
            entry("b", "u1", "meet", "Standup", "2026-04-01T23:59:59.500Z"),
            entry("c", "u2", "dev", "", "2026-04-02T08:00:00Z"),
            entry("d", "u2", "dev", "bug triage", "2026-03-31T23:59:59.999Z"),
        ]
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let filter = EntryFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(sample(), utc_offset()).len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let filter = EntryFilter {
            search: Some("bug".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample(), utc_offset())), vec!["a", "d"]);
    }

    #[test]
    fn test_empty_description_never_matches_search() {
        let filter = EntryFilter {
            search: Some("a".to_string()),
            ..Default::default()
        };
        let result = filter.apply(sample(), utc_offset());
        assert!(!ids(&result).contains(&"c"));
    }

    #[test]
    fn test_single_day_range_is_inclusive() {
        let day: NaiveDate = "2026-04-01".parse().unwrap();
        let filter = EntryFilter {
            start_date: Some(day),
            end_date: Some(day),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample(), utc_offset())), vec!["a", "b"]);
    }

    #[test]
    fn test_date_bounds_follow_local_offset() {
        let day: NaiveDate = "2026-04-01".parse().unwrap();
        let filter = EntryFilter {
            start_date: Some(day),
            end_date: Some(day),
            ..Default::default()
        };
        // At UTC+01:00 the local day 2026-04-01 is [03-31T23:00Z, 04-01T22:59:59.999Z].
        let offset = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(ids(&filter.apply(sample(), offset)), vec!["a", "d"]);
    }

    #[test]
    fn test_constraints_are_anded() {
        let filter = EntryFilter {
            category_id: Some("dev".to_string()),
            user_id: Some("u2".to_string()),
            search: Some("triage".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample(), utc_offset())), vec!["d"]);
    }

    #[test]
    fn test_query_string_empty_values_are_ignored() {
        let filter: EntryFilter = serde_json::from_value(serde_json::json!({
            "search": "",
            "startDate": "",
            "endDate": "2026-04-01",
            "categoryId": "",
            "userId": ""
        }))
        .unwrap();
        assert!(filter.search.is_none());
        assert!(filter.start_date.is_none());
        assert_eq!(filter.end_date, Some("2026-04-01".parse().unwrap()));
    }
}
