//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{
    CreateLinkRequest, DeleteLinkQuery, LinkListResponse, LinkResponse, ListLinksQuery,
    UpdateLinkRequest,
};
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Creates a link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Errors
///
/// Returns 400 for an invalid destination or slug, 409 when the slug is
/// already taken by a live link.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_link(payload.into_new_link()?)
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Lists links with pagination.
///
/// # Endpoint
///
/// `GET /api/links?page=1&page_size=20&status=published`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Query(query): Query<ListLinksQuery>,
) -> Result<Json<LinkListResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (items, total) = state
        .link_service
        .list_links(page, page_size, query.status)
        .await?;

    Ok(Json(LinkListResponse {
        total,
        page,
        page_size,
        items: items.into_iter().map(LinkResponse::from).collect(),
    }))
}

/// Fetches one link by slug.
///
/// # Endpoint
///
/// `GET /api/links/{slug}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(&slug).await?;
    Ok(Json(link.into()))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PATCH /api/links/{slug}`
pub async fn update_link_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update_link(&slug, payload.into_patch()?)
        .await?;

    Ok(Json(link.into()))
}

/// Trashes a link, or permanently deletes it with `?permanent=true`.
///
/// Permanent deletion removes the link's clicks too when the
/// `delete_tracking_data_on_link_deletion` setting is enabled.
///
/// # Endpoint
///
/// `DELETE /api/links/{slug}[?permanent=true]`
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<DeleteLinkQuery>,
) -> Result<StatusCode, AppError> {
    if query.permanent {
        let link = state.link_service.get_link(&slug).await?;
        let settings = state.settings_service.current().await?;
        state
            .link_service
            .delete_link_permanently(link.id, &settings)
            .await?;
    } else {
        state.link_service.trash_link(&slug).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Restores a trashed link (as a draft). Id-addressed because trashed links
/// no longer resolve by slug.
///
/// # Endpoint
///
/// `POST /api/links/id/{id}/restore`
pub async fn restore_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.restore_link(id).await?;
    Ok(Json(link.into()))
}

/// Permanently deletes a link by id, reaching trashed links too.
///
/// # Endpoint
///
/// `DELETE /api/links/id/{id}`
pub async fn delete_link_by_id_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let settings = state.settings_service.current().await?;
    state
        .link_service
        .delete_link_permanently(id, &settings)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
