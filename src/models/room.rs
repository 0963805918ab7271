//! Room model: a presence channel with an optional meeting link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A room and its current participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub meet_link: Option<String>,
    pub participants: Vec<RoomParticipant>,
}

/// A user currently present in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomParticipant {
    pub user_id: String,
    pub user_name: String,
    pub joined_at: DateTime<Utc>,
}

/// Request body for creating or updating a room.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub meet_link: Option<String>,
}

/// Result of joining a room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResponse {
    pub room_id: String,
    pub meet_link: Option<String>,
}
