//! HTTP server initialization and runtime setup.
//!
//! Wires the connection pool, marker store, background workers, and Axum
//! server lifecycle together.

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::application::services::{
    AuthService, ClickService, LinkService, RedirectService, SettingsService, StatsService,
};
use crate::config::Config;
use crate::domain::analytics_worker::run_analytics_worker;
use crate::domain::repositories::ClickRepository;
use crate::infrastructure::analytics::GaClient;
use crate::infrastructure::geo::GeoResolver;
use crate::infrastructure::keyvalue::{MemoryTtlStore, RedisTtlStore, TtlStore};
use crate::infrastructure::persistence::{
    PgClickRepository, PgLinkRepository, PgSettingsRepository, PgTokenRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

/// Interval between retention sweeps.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis marker store (or in-process fallback)
/// - Background analytics forwarder and retention sweeper
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if the database connection, migration run, or server
/// bind fails.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await?;
    info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let markers: Arc<dyn TtlStore> = match &config.redis_url {
        Some(redis_url) => match RedisTtlStore::connect(redis_url).await {
            Ok(redis) => {
                info!("Dedup markers shared via Redis");
                Arc::new(redis)
            }
            Err(e) => {
                warn!("Failed to connect to Redis: {e}. Using in-process markers.");
                Arc::new(MemoryTtlStore::new())
            }
        },
        None => {
            info!("Dedup markers kept in process (no Redis configured)");
            Arc::new(MemoryTtlStore::new())
        }
    };

    let (analytics_tx, analytics_rx) = mpsc::channel(config.analytics_queue_capacity);
    tokio::spawn(run_analytics_worker(
        analytics_rx,
        Arc::new(GaClient::new()),
    ));
    info!("Analytics forwarding worker started");

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository = Arc::new(PgClickRepository::new(pool.clone()));
    let settings_repository = Arc::new(PgSettingsRepository::new(pool.clone()));
    let token_repository = Arc::new(PgTokenRepository::new(pool.clone()));

    let settings_service = Arc::new(SettingsService::new(settings_repository));
    let click_service = Arc::new(ClickService::new(
        click_repository.clone(),
        markers.clone(),
        analytics_tx.clone(),
    ));
    let redirect_service = Arc::new(RedirectService::new(
        link_repository.clone(),
        click_service,
        Arc::new(GeoResolver::new()),
        config.token_signing_secret.clone(),
        config.public_base_url.clone(),
        config.url_prefix.clone(),
    ));
    let link_service = Arc::new(LinkService::new(
        link_repository,
        click_repository.clone(),
    ));
    let stats_service = Arc::new(StatsService::new(click_repository.clone()));
    let auth_service = Arc::new(AuthService::new(
        token_repository,
        config.token_signing_secret.clone(),
    ));

    spawn_retention_sweeper(click_repository, settings_service.clone());

    let state = AppState {
        link_service,
        redirect_service,
        stats_service,
        settings_service,
        auth_service,
        markers,
        analytics_tx,
        behind_proxy: config.behind_proxy,
        url_prefix: config.url_prefix.clone(),
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}

/// Daily retention sweep: purges clicks past the configured expiry.
///
/// The settings snapshot is re-read on every tick, so toggling data expiry
/// takes effect without a restart.
fn spawn_retention_sweeper(
    clicks: Arc<dyn ClickRepository>,
    settings_service: Arc<SettingsService>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let settings = match settings_service.current().await {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("retention sweep skipped, settings unavailable: {e}");
                    continue;
                }
            };

            if !settings.enable_data_expiry {
                continue;
            }

            let cutoff = Utc::now() - chrono::Duration::days(settings.data_expiry_days as i64);
            match clicks.purge_older_than(cutoff).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "expired click data purged"),
                Err(e) => warn!("retention sweep failed: {e}"),
            }
        }
    });
}
