//! Login and self-service account endpoints.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::auth::{generate_access_token, hash_password, validate_password, verify_password, AuthUser};
use crate::errors::AppError;
use crate::models::{ChangePasswordRequest, LoginRequest, LoginResponse, User};
use crate::AppState;

/// POST /api/auth/login - Exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let (user, hash) = match state.repo.find_credentials(&request.email).await {
        Ok(Some(found)) => found,
        Ok(None) => return error(invalid(), revision_id),
        Err(e) => return error(e, revision_id),
    };

    match verify_password(&request.password, &hash) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("Failed login for {}", user.email);
            return error(invalid(), revision_id);
        }
        Err(e) => return error(e, revision_id),
    }

    match generate_access_token(&user.id, user.role, &state.jwt) {
        Ok((token, expires_at)) => success(
            LoginResponse {
                token,
                expires_at,
                user,
            },
            revision_id,
        ),
        Err(e) => error(
            AppError::Internal(format!("Failed to issue token: {}", e)),
            revision_id,
        ),
    }
}

/// GET /api/auth/me - The signed-in user.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_user(&auth.user_id).await {
        Ok(Some(user)) => success(user, revision_id),
        Ok(None) => error(
            AppError::Unauthorized("User no longer exists".to_string()),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/change-password - Change own password after re-checking the current one.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_password(&request.new_password) {
        return error(e, revision_id);
    }

    let hash = match state.repo.get_password_hash(&auth.user_id).await {
        Ok(Some(hash)) => hash,
        Ok(None) => {
            return error(
                AppError::Unauthorized("User no longer exists".to_string()),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    match verify_password(&request.current_password, &hash) {
        Ok(true) => {}
        Ok(false) => {
            return error(
                AppError::Validation("Current password is incorrect".to_string()),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    }

    let result = match hash_password(&request.new_password) {
        Ok(new_hash) => state.repo.set_password_hash(&auth.user_id, &new_hash).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            tracing::info!("User {} changed their password", auth.user_id);
            success((), revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}
