//! Category and tag models.
//!
//! Both are named, colored labels. Categories are required on every entry and
//! must always exist; tags are optional and can be deleted freely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, colored bucket every entry belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// An optional, colored label on entries and timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a category or tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Request body for updating a category or tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Body of destructive deletes that require a typed phrase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteConfirmation {
    #[serde(default)]
    pub confirmation: String,
}

impl DeleteConfirmation {
    pub fn matches(&self, phrase: &str) -> bool {
        self.confirmation == phrase
    }
}
