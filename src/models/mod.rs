//! Data models for the TeamTime application.
//!
//! Field names serialize as camelCase to match the dashboard client.

mod entry;
mod room;
mod tag;
mod user;

pub use entry::*;
pub use room::*;
pub use tag::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Revision information for change detection by polling clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
