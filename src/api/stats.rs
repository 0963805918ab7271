//! Admin statistics endpoints.

use axum::extract::{Query, State};
use chrono::Utc;
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::auth::RequireAdmin;
use crate::format::start_of_day;
use crate::stats::{build_rollup, build_timeseries, parse_window, Period, SeriesMode, TimeSeries, UserStats};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// GET /api/admin/stats?period=week|month|all - Per-user totals by category.
///
/// Every user is listed, including those with no entries in the period.
pub async fn get_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Vec<UserStats>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let period = Period::parse(query.period.as_deref());
    let since = period.lower_bound(Utc::now(), state.config.local_offset());

    let users = match state.repo.list_users().await {
        Ok(users) => users,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.rollup_rows(since).await {
        Ok(rows) => success(build_rollup(&users, rows), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/stats/timeseries?startDate&endDate&userId - Daily totals per series.
///
/// `endDate` is exclusive. `userId` absent or `all` charts one series per user;
/// otherwise one series per category of that user.
pub async fn get_timeseries(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<TimeseriesQuery>,
) -> ApiResult<TimeSeries> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let (start, end) = match parse_window(query.start_date.as_deref(), query.end_date.as_deref()) {
        Ok(window) => window,
        Err(e) => return error(e, revision_id),
    };
    let mode = SeriesMode::from_user_param(query.user_id.as_deref());
    let offset = state.config.local_offset();

    match state
        .repo
        .series_rows(
            start_of_day(start, offset),
            start_of_day(end, offset),
            mode.user_scope(),
        )
        .await
    {
        Ok(rows) => success(build_timeseries(mode, &rows, start, end, offset), revision_id),
        Err(e) => error(e, revision_id),
    }
}
