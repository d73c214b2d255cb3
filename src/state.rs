//! Shared application state injected into all handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{
    AuthService, LinkService, RedirectService, SettingsService, StatsService,
};
use crate::domain::analytics_event::AnalyticsEvent;
use crate::infrastructure::keyvalue::TtlStore;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub stats_service: Arc<StatsService>,
    pub settings_service: Arc<SettingsService>,
    pub auth_service: Arc<AuthService>,
    /// Dedup marker store, exposed for health checks.
    pub markers: Arc<dyn TtlStore>,
    /// Analytics queue handle, exposed for health checks.
    pub analytics_tx: mpsc::Sender<AnalyticsEvent>,
    /// When true, client IPs are read from proxy headers.
    pub behind_proxy: bool,
    /// Path segment under which short links are served (e.g. `go`).
    pub url_prefix: String,
}
