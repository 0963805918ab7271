//! Active timer endpoints: start, relabel, stop, discard, and the team view.
//!
//! Elapsed time is always derived from the stored start instant at read time.

use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;

use super::{error, optional_json, success, ApiResult};
use crate::auth::AuthUser;
use crate::db::TimerLabels;
use crate::errors::AppError;
use crate::models::{
    ActiveTimer, ActiveTimerStatus, StartTimerRequest, StopTimerRequest, TeamActiveTimer,
    TimeEntry, UpdateTimerRequest,
};
use crate::timer::TimerView;
use crate::AppState;

fn labels(
    category_id: &str,
    tag_id: Option<&str>,
    description: Option<&str>,
) -> Result<TimerLabels, AppError> {
    let category_id = category_id.trim();
    if category_id.is_empty() {
        return Err(AppError::Validation("Category is required".to_string()));
    }
    Ok(TimerLabels {
        category_id: category_id.to_string(),
        tag_id: tag_id.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string),
        description: description.unwrap_or_default().to_string(),
    })
}

/// GET /api/team/active - Everyone who is clocked in, longest running first.
pub async fn list_active_timers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Vec<TeamActiveTimer>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_active_timers(Utc::now()).await {
        Ok(timers) => success(timers, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/team/active/me - The caller's running timer, or `null`.
pub async fn get_my_timer(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Option<ActiveTimerStatus>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_timer(&auth.user_id).await {
        Ok(timer) => {
            let now = Utc::now();
            let status = timer.map(|timer| ActiveTimerStatus {
                elapsed_seconds: TimerView::restore(Some(&timer)).elapsed(now),
                timer,
            });
            success(status, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/team/active - Start a timer, replacing any running one.
pub async fn start_timer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<StartTimerRequest>,
) -> ApiResult<ActiveTimer> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let labels = match labels(
        &request.category_id,
        request.tag_id.as_deref(),
        request.description.as_deref(),
    ) {
        Ok(labels) => labels,
        Err(e) => return error(e, revision_id),
    };
    let start_time = request.start_time.unwrap_or_else(Utc::now);

    match state.repo.start_timer(&auth.user_id, &labels, start_time).await {
        Ok(timer) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(timer, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/team/active - Relabel the running timer.
///
/// Without a running timer this succeeds with `data: null`.
pub async fn update_timer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateTimerRequest>,
) -> ApiResult<Option<ActiveTimer>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let labels = match labels(
        &request.category_id,
        request.tag_id.as_deref(),
        request.description.as_deref(),
    ) {
        Ok(labels) => labels,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.update_timer(&auth.user_id, &labels).await {
        Ok(timer) => {
            if timer.is_none() {
                tracing::debug!("No running timer to update for user {}", auth.user_id);
            }
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(timer, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/team/active - Discard the running timer without recording it.
pub async fn discard_timer(State(state): State<AppState>, auth: AuthUser) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.discard_timer(&auth.user_id).await {
        Ok(_) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/team/active/stop - Stop the running timer and record the entry.
///
/// The body is optional: `{endTime?, duration?}`. Returns the recorded entry,
/// or `null` when there was no timer or nothing had elapsed.
pub async fn stop_timer(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> ApiResult<Option<TimeEntry>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request: StopTimerRequest = match optional_json(&body) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    match state
        .repo
        .stop_and_record(&auth.user_id, request.end_time, request.duration)
        .await
    {
        Ok(entry) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(entry, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_require_category_and_drop_blank_tag() {
        assert!(matches!(
            labels("  ", None, None),
            Err(AppError::Validation(_))
        ));

        let parsed = labels("cat-1", Some(""), None).unwrap();
        assert_eq!(parsed.category_id, "cat-1");
        assert_eq!(parsed.tag_id, None);
        assert_eq!(parsed.description, "");
    }
}
