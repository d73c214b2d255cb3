//! Handler for the health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health with per-component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: all components healthy
/// - **503 Service Unavailable**: one or more components degraded
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let marker_check = check_marker_store(&state).await;
    let queue_check = check_analytics_queue(&state);

    let all_healthy = db_check.status == "ok"
        && marker_check.status == "ok"
        && queue_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            marker_store: marker_check,
            analytics_queue: queue_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks database connectivity through a trivial link count.
async fn check_database(state: &AppState) -> CheckStatus {
    match state.link_service.list_links(1, 1, None).await {
        Ok((_, total)) => CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Connected, {total} links")),
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("Database error: {e}")),
        },
    }
}

async fn check_marker_store(state: &AppState) -> CheckStatus {
    if state.markers.health_check().await {
        CheckStatus {
            status: "ok".to_string(),
            message: None,
        }
    } else {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Marker store unreachable".to_string()),
        }
    }
}

fn check_analytics_queue(state: &AppState) -> CheckStatus {
    if state.analytics_tx.is_closed() {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Analytics queue is closed".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Capacity: {}", state.analytics_tx.capacity())),
        }
    }
}
