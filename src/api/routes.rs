//! REST API route table (everything under `/api`).

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::api::handlers::{links, settings, stats};
use crate::state::AppState;

/// Routes requiring bearer authentication.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/links",
            get(links::list_links_handler).post(links::create_link_handler),
        )
        .route("/links/id/{id}", delete(links::delete_link_by_id_handler))
        .route(
            "/links/id/{id}/restore",
            post(links::restore_link_handler),
        )
        .route(
            "/links/{slug}",
            get(links::get_link_handler)
                .patch(links::update_link_handler)
                .delete(links::delete_link_handler),
        )
        .route(
            "/settings",
            get(settings::get_settings_handler).put(settings::put_settings_handler),
        )
        .route("/insights/timeseries", get(stats::timeseries_handler))
        .route("/insights/top", get(stats::top_links_handler))
        .route("/insights/recent", get(stats::recent_clicks_handler))
}
