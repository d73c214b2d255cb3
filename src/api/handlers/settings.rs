//! Handlers for reading and saving the settings document.

use axum::{Json, extract::State};

use crate::domain::entities::Settings;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the current settings snapshot.
///
/// # Endpoint
///
/// `GET /api/settings`
pub async fn get_settings_handler(
    State(state): State<AppState>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.settings_service.current().await?))
}

/// Replaces the settings document. The whole document is submitted; missing
/// keys revert to their defaults.
///
/// # Endpoint
///
/// `PUT /api/settings`
pub async fn put_settings_handler(
    State(state): State<AppState>,
    Json(payload): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.settings_service.save(payload).await?))
}
