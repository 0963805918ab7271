//! Tag API endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use super::categories::{validate_label, validate_label_update};
use super::{error, optional_json, success, ApiResult};
use crate::auth::{AuthUser, RequireAdmin};
use crate::errors::AppError;
use crate::models::{CreateLabelRequest, DeleteConfirmation, Tag, UpdateLabelRequest};
use crate::AppState;

/// Phrase the client must send to delete a tag.
pub const DELETE_TAG_PHRASE: &str = "delete this tag";

/// GET /api/tags - List all tags.
pub async fn list_tags(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Vec<Tag>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_tags().await {
        Ok(tags) => success(tags, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/tags - Create a new tag.
pub async fn create_tag(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(request): Json<CreateLabelRequest>,
) -> ApiResult<Tag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request = match validate_label(request) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.create_tag(&request).await {
        Ok(tag) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(tag, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/tags/:id - Update a tag.
pub async fn update_tag(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(request): Json<UpdateLabelRequest>,
) -> ApiResult<Tag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_label_update(&request) {
        return error(e, revision_id);
    }

    match state.repo.update_tag(&id, &request).await {
        Ok(tag) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(tag, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/tags/:id - Delete a tag. Requires the confirmation phrase.
///
/// Entries and timers carrying the tag keep existing without it.
pub async fn delete_tag(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_tag(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error(AppError::NotFound(format!("Tag {} not found", id)), revision_id),
        Err(e) => return error(e, revision_id),
    }

    let confirmation: DeleteConfirmation = match optional_json(&body) {
        Ok(c) => c,
        Err(e) => return error(e, revision_id),
    };
    if !confirmation.matches(DELETE_TAG_PHRASE) {
        return error(
            AppError::Validation(format!(
                "Please type \"{}\" to confirm deletion",
                DELETE_TAG_PHRASE
            )),
            revision_id,
        );
    }

    match state.repo.delete_tag(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
