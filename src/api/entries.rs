//! Time entry endpoints: the caller's own ledger and the team feed.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::auth::AuthUser;
use crate::db::DEFAULT_FEED_LIMIT;
use crate::errors::AppError;
use crate::filter::EntryFilter;
use crate::format::{end_of_day, start_of_day};
use crate::models::{CreateEntryRequest, TeamEntry, TimeEntry, UpdateEntryRequest};
use crate::AppState;

/// Feed size for `GET /api/team/entries`.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub limit: Option<String>,
}

/// GET /api/time-entries - Own entries, newest first, filtered by the query.
pub async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<EntryFilter>,
) -> ApiResult<Vec<TimeEntry>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let offset = state.config.local_offset();

    match state.repo.list_entries_by_user(&auth.user_id).await {
        Ok(entries) => success(filter.apply(entries, offset), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/time-entries - Record an entry for the caller.
pub async fn create_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateEntryRequest>,
) -> ApiResult<TimeEntry> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.category_id.trim().is_empty() {
        return error(
            AppError::Validation("Category is required".to_string()),
            revision_id,
        );
    }
    if request.duration < 0 {
        return error(
            AppError::Validation("Duration must not be negative".to_string()),
            revision_id,
        );
    }

    match state.repo.create_entry(&auth.user_id, &request).await {
        Ok(entry) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(entry, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/time-entries/:id - Edit an entry. Owner or admin only.
pub async fn update_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateEntryRequest>,
) -> ApiResult<TimeEntry> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.duration.is_some_and(|d| d < 0) {
        return error(
            AppError::Validation("Duration must not be negative".to_string()),
            revision_id,
        );
    }
    if request
        .category_id
        .as_deref()
        .is_some_and(|c| c.trim().is_empty())
    {
        return error(
            AppError::Validation("Category is required".to_string()),
            revision_id,
        );
    }
    if let Err(e) = ensure_can_modify(&state, &auth, &id).await {
        return error(e, revision_id);
    }

    match state.repo.update_entry(&id, &request).await {
        Ok(entry) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(entry, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/time-entries/:id - Delete an entry. Owner or admin only.
pub async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = ensure_can_modify(&state, &auth, &id).await {
        return error(e, revision_id);
    }

    match state.repo.delete_entry(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/team/entries - Team feed with display metadata.
///
/// With a date bound the whole range is returned; otherwise the most recent
/// `limit` entries (default 100, at most 500). Other filters apply on top.
pub async fn list_team_entries(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(feed): Query<FeedQuery>,
    Query(filter): Query<EntryFilter>,
) -> ApiResult<Vec<TeamEntry>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let offset = state.config.local_offset();

    let result = if filter.start_date.is_some() || filter.end_date.is_some() {
        let from = filter.start_date.map(|d| start_of_day(d, offset));
        let until = filter.end_date.map(|d| end_of_day(d, offset));
        state
            .repo
            .list_team_entries_between(from, until, filter.user_id.as_deref())
            .await
    } else {
        let limit = match parse_limit(feed.limit.as_deref()) {
            Ok(limit) => limit,
            Err(e) => return error(e, revision_id),
        };
        state.repo.list_team_entries(limit).await
    };

    match result {
        Ok(entries) => success(filter.apply(entries, offset), revision_id),
        Err(e) => error(e, revision_id),
    }
}

fn parse_limit(raw: Option<&str>) -> Result<i64, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_FEED_LIMIT),
        Some(s) => s
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::Validation("limit must be a positive integer".to_string())),
    }
}

/// The caller may change an entry when they own it or are an admin.
async fn ensure_can_modify(state: &AppState, auth: &AuthUser, id: &str) -> Result<(), AppError> {
    let entry = state
        .repo
        .get_entry(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Time entry {} not found", id)))?;

    if entry.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Forbidden(
            "You can only modify your own time entries".to_string(),
        ));
    }
    Ok(())
}
