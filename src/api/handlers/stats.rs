//! Handlers for the insights (analytics read-path) endpoints.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::dto::stats::{
    ClickEntry, RecentClicksQuery, RecentClicksResponse, TimeseriesPoint, TimeseriesQuery,
    TopLinkEntry, TopLinksQuery,
};
use crate::error::AppError;
use crate::state::AppState;

/// Per-day click counts for charting.
///
/// # Endpoint
///
/// `GET /api/insights/timeseries?from=2025-06-01&to=2025-06-30[&link_id=7]`
pub async fn timeseries_handler(
    State(state): State<AppState>,
    Query(query): Query<TimeseriesQuery>,
) -> Result<Json<Vec<TimeseriesPoint>>, AppError> {
    let series = state
        .stats_service
        .timeseries(query.link_id, query.from, query.to)
        .await?;

    Ok(Json(series.into_iter().map(TimeseriesPoint::from).collect()))
}

/// Most-clicked links leaderboard.
///
/// # Endpoint
///
/// `GET /api/insights/top?limit=10[&from=...&to=...]`
pub async fn top_links_handler(
    State(state): State<AppState>,
    Query(query): Query<TopLinksQuery>,
) -> Result<Json<Vec<TopLinkEntry>>, AppError> {
    let totals = state
        .stats_service
        .top_links(
            query.from,
            query.to,
            query.limit.unwrap_or(10),
            query.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(totals.into_iter().map(TopLinkEntry::from).collect()))
}

/// Newest-first recorded clicks.
///
/// # Endpoint
///
/// `GET /api/insights/recent?limit=20[&link_id=7&offset=0]`
pub async fn recent_clicks_handler(
    State(state): State<AppState>,
    Query(query): Query<RecentClicksQuery>,
) -> Result<Json<RecentClicksResponse>, AppError> {
    let page = state
        .stats_service
        .recent_clicks(
            query.link_id,
            query.offset.unwrap_or(0),
            query.limit.unwrap_or(20),
        )
        .await?;

    Ok(Json(RecentClicksResponse {
        total: page.total,
        items: page.items.into_iter().map(ClickEntry::from).collect(),
    }))
}
