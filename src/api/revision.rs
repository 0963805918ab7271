//! Revision endpoint for polling clients.

use axum::extract::State;

use super::{error, success, ApiResult};
use crate::auth::AuthUser;
use crate::models::RevisionInfo;
use crate::AppState;

/// GET /api/revision - Current revision, to skip refetching when nothing changed.
pub async fn get_revision(State(state): State<AppState>, _user: AuthUser) -> ApiResult<RevisionInfo> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_revision_info().await {
        Ok(info) => success(info, revision_id),
        Err(e) => error(e, revision_id),
    }
}
