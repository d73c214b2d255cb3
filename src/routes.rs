//! Top-level router.
//!
//! # Route Structure
//!
//! - `GET  /{prefix}/{slug}`  - short link redirect (public)
//! - `POST /{prefix}/{slug}`  - link password verification (public)
//! - `GET  /health`           - health check: DB, marker store, queue (public)
//! - `/api/*`                 - REST API (Bearer token required, rate limited)

use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api;
use crate::api::handlers::{health_handler, password_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;

/// Constructs the application router with all routes and middleware.
///
/// The slug route is mounted under the configured URL prefix, so the same
/// binary serves `/go/{slug}`, `/l/{slug}`, or whatever the deployment uses.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::api_layer());

    let slug_path = format!("/{}/{{slug}}", state.url_prefix);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            &slug_path,
            get(redirect_handler).post(password_handler),
        )
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
