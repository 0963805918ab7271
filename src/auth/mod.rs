//! Bearer-token authentication and role extractors.
//!
//! Handlers take [`AuthUser`] for any signed-in caller or [`RequireAdmin`] for
//! admin-only routes. Rejections use the regular error envelope.

pub mod jwt;
pub mod password;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::Role;
use crate::AppState;

pub use jwt::{generate_access_token, validate_token, JwtConfig};
pub use password::{hash_password, validate_password, verify_password};

/// Caller identity taken from a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        let claims = validate_token(token, &state.jwt).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        // The stored row is authoritative: demotions and deletions apply
        // to tokens that were issued before them.
        let user = state
            .repo
            .get_user(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;

        if user.role != Role::parse(&claims.role) {
            tracing::debug!("Role of user {} changed since token was issued", user.id);
        }

        Ok(AuthUser {
            user_id: user.id,
            role: user.role,
        })
    }
}

/// An [`AuthUser`] with the admin role. Rejects with 403 otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin role required".into()).into());
        }
        Ok(RequireAdmin(user))
    }
}
