//! Rooms and room presence. A user is in at most one room at a time.

use chrono::Utc;
use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::format::to_storage;
use crate::models::{JoinRoomResponse, Room, RoomParticipant, RoomRequest};

impl Repository {
    /// All rooms in creation order, each with its participants by join time.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        let rooms = sqlx::query(
            "SELECT id, name, meet_link FROM rooms ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let participants = sqlx::query(
            r#"
            SELECT rp.room_id, rp.user_id, u.name AS user_name, rp.joined_at
            FROM room_participants rp
            JOIN users u ON rp.user_id = u.id
            ORDER BY rp.joined_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rooms: Vec<Room> = rooms.iter().map(room_from_row).collect();
        for row in &participants {
            let room_id: String = row.get("room_id");
            if let Some(room) = rooms.iter_mut().find(|r| r.id == room_id) {
                room.participants.push(participant_from_row(row));
            }
        }
        Ok(rooms)
    }

    pub async fn get_room(&self, id: &str) -> Result<Option<Room>, AppError> {
        let row = sqlx::query("SELECT id, name, meet_link FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(mut room) = row.as_ref().map(room_from_row) else {
            return Ok(None);
        };

        let participants = sqlx::query(
            r#"
            SELECT rp.room_id, rp.user_id, u.name AS user_name, rp.joined_at
            FROM room_participants rp
            JOIN users u ON rp.user_id = u.id
            WHERE rp.room_id = ?
            ORDER BY rp.joined_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        room.participants = participants.iter().map(participant_from_row).collect();

        Ok(Some(room))
    }

    pub async fn create_room(&self, request: &RoomRequest) -> Result<Room, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let name = request.name.trim().to_string();
        let meet_link = clean_link(request.meet_link.as_deref());

        sqlx::query("INSERT INTO rooms (id, name, meet_link, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&name)
            .bind(&meet_link)
            .bind(to_storage(Utc::now()))
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(Room {
            id,
            name,
            meet_link,
            participants: Vec::new(),
        })
    }

    /// Replace a room's name and meeting link.
    pub async fn update_room(&self, id: &str, request: &RoomRequest) -> Result<Room, AppError> {
        let result = sqlx::query("UPDATE rooms SET name = ?, meet_link = ? WHERE id = ?")
            .bind(request.name.trim())
            .bind(clean_link(request.meet_link.as_deref()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Room {} not found", id)));
        }

        self.increment_revision().await?;
        self.get_room(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))
    }

    /// Delete a room. Its participants are removed by the schema.
    pub async fn delete_room(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Room {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Move the user into `room_id`, leaving whatever room they were in.
    pub async fn join_room(&self, room_id: &str, user_id: &str) -> Result<JoinRoomResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT meet_link FROM rooms WHERE id = ?")
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))?;
        let meet_link: Option<String> = row.get("meet_link");

        sqlx::query("DELETE FROM room_participants WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO room_participants (id, room_id, user_id, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(room_id)
        .bind(user_id)
        .bind(to_storage(Utc::now()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.increment_revision().await?;

        Ok(JoinRoomResponse {
            room_id: room_id.to_string(),
            meet_link,
        })
    }

    /// Leave `room_id`. Leaving a room the user is not in is a no-op.
    pub async fn leave_room(&self, room_id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM room_participants WHERE room_id = ? AND user_id = ?")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let left = result.rows_affected() > 0;
        if left {
            self.increment_revision().await?;
        }
        Ok(left)
    }
}

fn clean_link(link: Option<&str>) -> Option<String> {
    link.map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

fn room_from_row(row: &sqlx::sqlite::SqliteRow) -> Room {
    Room {
        id: row.get("id"),
        name: row.get("name"),
        meet_link: row.get("meet_link"),
        participants: Vec::new(),
    }
}

fn participant_from_row(row: &sqlx::sqlite::SqliteRow) -> RoomParticipant {
    RoomParticipant {
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        joined_at: row.get("joined_at"),
    }
}
