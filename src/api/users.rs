//! User management endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, required, success, ApiResult};
use crate::auth::{hash_password, validate_password, AuthUser, RequireAdmin};
use crate::errors::AppError;
use crate::models::{CreateUserRequest, UpdateUserRequest, User};
use crate::AppState;

/// GET /api/users - List all users.
pub async fn list_users(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Vec<User>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_users().await {
        Ok(users) => success(users, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/users - Create a user.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(mut request): Json<CreateUserRequest>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = normalize_new_user(&mut request) {
        return error(e, revision_id);
    }

    let hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.create_user(&request, &hash).await {
        Ok(user) => {
            tracing::info!("Created user {} ({})", user.id, user.role.as_str());
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(user, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PATCH /api/users/:id - Rename, change role, or reset the password.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Some(name) = &request.name {
        if let Err(e) = required(name, "Name") {
            return error(e, revision_id);
        }
    }

    let hash = match request.password.as_deref() {
        Some(password) => match validate_password(password).and_then(|_| hash_password(password)) {
            Ok(hash) => Some(hash),
            Err(e) => return error(e, revision_id),
        },
        None => None,
    };

    match state
        .repo
        .update_user(&id, request.name.as_deref(), request.role, hash.as_deref())
        .await
    {
        Ok(user) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(user, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/users/:id - Delete a user with all their entries.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if admin.user_id == id {
        return error(
            AppError::Validation("You cannot delete your own account".to_string()),
            revision_id,
        );
    }

    match state.repo.delete_user(&id).await {
        Ok(()) => {
            tracing::info!("User {} deleted by {}", id, admin.user_id);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

fn normalize_new_user(request: &mut CreateUserRequest) -> Result<(), AppError> {
    request.name = required(&request.name, "Name")?;
    request.email = required(&request.email, "Email")?;
    if !request.email.contains('@') {
        return Err(AppError::Validation("Email is invalid".to_string()));
    }
    validate_password(&request.password)
}
