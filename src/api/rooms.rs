//! Room endpoints: shared presence channels with an optional meeting link.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use super::{error, optional_json, required, success, ApiResult};
use crate::auth::{AuthUser, RequireAdmin};
use crate::errors::AppError;
use crate::models::{DeleteConfirmation, JoinRoomResponse, Room, RoomRequest};
use crate::AppState;

/// Phrase the client must send to delete a room.
pub const DELETE_ROOM_PHRASE: &str = "delete this room";

/// GET /api/rooms - All rooms with who is in them.
pub async fn list_rooms(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Vec<Room>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_rooms().await {
        Ok(rooms) => success(rooms, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/rooms - Create a room.
pub async fn create_room(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(mut request): Json<RoomRequest>,
) -> ApiResult<Room> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    request.name = match required(&request.name, "Name") {
        Ok(name) => name,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.create_room(&request).await {
        Ok(room) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(room, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/rooms/:id - Replace name and meeting link.
pub async fn update_room(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(mut request): Json<RoomRequest>,
) -> ApiResult<Room> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    request.name = match required(&request.name, "Name") {
        Ok(name) => name,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.update_room(&id, &request).await {
        Ok(room) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(room, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/rooms/:id - Delete a room. Requires the confirmation phrase.
pub async fn delete_room(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_room(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error(AppError::NotFound(format!("Room {} not found", id)), revision_id),
        Err(e) => return error(e, revision_id),
    }

    let confirmation: DeleteConfirmation = match optional_json(&body) {
        Ok(c) => c,
        Err(e) => return error(e, revision_id),
    };
    if !confirmation.matches(DELETE_ROOM_PHRASE) {
        return error(
            AppError::Validation(format!(
                "Please type \"{}\" to confirm deletion",
                DELETE_ROOM_PHRASE
            )),
            revision_id,
        );
    }

    match state.repo.delete_room(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/rooms/:id/join - Enter a room, leaving any other.
pub async fn join_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JoinRoomResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.join_room(&id, &auth.user_id).await {
        Ok(joined) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(joined, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/rooms/:id/leave - Leave a room. Not being in it is fine.
pub async fn leave_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.leave_room(&id, &auth.user_id).await {
        Ok(_) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
