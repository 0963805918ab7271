//! Category API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, required, success, ApiResult};
use crate::auth::{AuthUser, RequireAdmin};
use crate::errors::AppError;
use crate::models::{Category, CreateLabelRequest, UpdateLabelRequest};
use crate::AppState;

/// GET /api/categories - List all categories in creation order.
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Vec<Category>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_categories().await {
        Ok(categories) => success(categories, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/categories - Create a category.
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(request): Json<CreateLabelRequest>,
) -> ApiResult<Category> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request = match validate_label(request) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.create_category(&request).await {
        Ok(category) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(category, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/categories/:id - Rename or recolor a category.
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(request): Json<UpdateLabelRequest>,
) -> ApiResult<Category> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_label_update(&request) {
        return error(e, revision_id);
    }

    match state.repo.update_category(&id, &request).await {
        Ok(category) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(category, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/categories/:id - Delete an unused category.
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_category(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Both name and color are required on create.
pub(crate) fn validate_label(request: CreateLabelRequest) -> Result<CreateLabelRequest, AppError> {
    Ok(CreateLabelRequest {
        name: required(&request.name, "Name")?,
        color: required(&request.color, "Color")?,
    })
}

/// Present fields must not be blank.
pub(crate) fn validate_label_update(request: &UpdateLabelRequest) -> Result<(), AppError> {
    if let Some(name) = &request.name {
        required(name, "Name")?;
    }
    if let Some(color) = &request.color {
        required(color, "Color")?;
    }
    Ok(())
}
