//! Click eligibility and recording.
//!
//! The eligibility check is stateful: passing it sets the dedup marker, so it
//! must run at most once per click attempt. Recording itself is a synchronous
//! single insert; only the analytics forwarding rides the background queue.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::application::request_context::RequestContext;
use crate::domain::analytics_event::AnalyticsEvent;
use crate::domain::entities::{Link, NewClick, Settings};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;
use crate::infrastructure::keyvalue::TtlStore;
use crate::utils::cookies::{DAY, build_set_cookie};
use crate::utils::user_agent::is_bot;

/// Two near-simultaneous clicks from one IP within this window collapse into
/// a single recorded event (browser prefetch, double submits).
pub const DEDUP_WINDOW: Duration = Duration::from_secs(5);

/// Long-lived pseudonymous visitor identifier.
pub const VISITOR_COOKIE: &str = "lc_visitor";
const VISITOR_COOKIE_MAX_AGE: i64 = 30 * DAY;

/// Analytics client identifier forwarded to GA.
pub const GA_COOKIE: &str = "lc_ga";
const GA_COOKIE_MAX_AGE: i64 = 2 * 365 * DAY;

/// Result of a tracking attempt.
#[derive(Debug, Default)]
pub struct TrackOutcome {
    pub recorded: bool,
    /// `Set-Cookie` values for freshly-generated identifiers.
    pub set_cookies: Vec<String>,
}

/// Service deciding whether a click counts and persisting it when it does.
pub struct ClickService {
    clicks: Arc<dyn ClickRepository>,
    markers: Arc<dyn TtlStore>,
    analytics_tx: mpsc::Sender<AnalyticsEvent>,
    dedup_window: Duration,
}

impl ClickService {
    pub fn new(
        clicks: Arc<dyn ClickRepository>,
        markers: Arc<dyn TtlStore>,
        analytics_tx: mpsc::Sender<AnalyticsEvent>,
    ) -> Self {
        Self {
            clicks,
            markers,
            analytics_tx,
            dedup_window: DEDUP_WINDOW,
        }
    }

    /// Overrides the dedup window; used by tests to avoid real 5-second waits.
    #[cfg(test)]
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    /// Decides whether this click should be recorded, and claims the dedup
    /// marker when it should.
    ///
    /// Every ambiguous branch answers "no": reporting disabled, unresolvable
    /// IP, excluded IP or role, bot traffic. Marker-store failures fail open —
    /// a degraded Redis must not stop click recording.
    ///
    /// Calling this twice for one click would suppress the second recording;
    /// [`Self::track`] calls it exactly once.
    pub async fn should_record(
        &self,
        link_id: i64,
        ctx: &RequestContext,
        settings: &Settings,
    ) -> bool {
        if settings.disable_reporting {
            return false;
        }

        let Some(ip) = ctx.ip.as_deref() else {
            return false;
        };

        if settings.excluded_ips.iter().any(|excluded| excluded == ip) {
            return false;
        }

        if ctx
            .roles
            .iter()
            .any(|role| settings.excluded_roles.contains(role))
        {
            return false;
        }

        if settings.exclude_bots && is_bot(ctx.user_agent.as_deref()) {
            return false;
        }

        let key = dedup_key(link_id, ip);
        if matches!(self.markers.get(&key).await, Ok(Some(_))) {
            return false;
        }

        let _ = self.markers.put(&key, "1", self.dedup_window).await;
        true
    }

    /// Records one click for `link`, honoring the tracking toggles, and
    /// enqueues the analytics event when forwarding is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the storage insert fails. The
    /// caller logs and proceeds — the redirect must never depend on this.
    pub async fn track(
        &self,
        link: &Link,
        destination: &str,
        public_link_url: &str,
        ctx: &RequestContext,
        settings: &Settings,
    ) -> Result<TrackOutcome, AppError> {
        if !self.should_record(link.id, ctx, settings).await {
            return Ok(TrackOutcome::default());
        }

        let mut set_cookies = Vec::new();

        let visitor_id = if settings.track_unique_visitors {
            Some(match ctx.cookie(VISITOR_COOKIE) {
                Some(existing) => existing.to_string(),
                None => {
                    let id = Uuid::new_v4().to_string();
                    set_cookies.push(build_set_cookie(
                        VISITOR_COOKIE,
                        &id,
                        VISITOR_COOKIE_MAX_AGE,
                        false,
                    ));
                    id
                }
            })
        } else {
            None
        };

        if settings.ga_forwarding_active() {
            let client_id = match ctx.cookie(GA_COOKIE) {
                Some(existing) => existing.to_string(),
                None => {
                    let id = Uuid::new_v4().to_string();
                    set_cookies.push(build_set_cookie(GA_COOKIE, &id, GA_COOKIE_MAX_AGE, false));
                    id
                }
            };

            let event = AnalyticsEvent {
                measurement_id: settings.ga_measurement_id.clone(),
                api_secret: settings.ga_api_secret.clone(),
                client_id,
                link_id: link.id,
                link_title: link.slug.clone(),
                link_url: public_link_url.to_string(),
                destination_url: destination.to_string(),
            };

            if self.analytics_tx.try_send(event).is_err() {
                debug!(link_id = link.id, "analytics queue full, event dropped");
                counter!("linkcentral_analytics_dropped_total").increment(1);
            }
        }

        let new_click = NewClick {
            link_id: link.id,
            ip_address: settings.track_ip.then(|| ctx.ip.clone()).flatten(),
            referring_url: ctx.referrer.clone().unwrap_or_default(),
            user_agent: settings
                .track_user_agent
                .then(|| ctx.user_agent.clone())
                .flatten(),
            visitor_id,
            destination_url: destination.to_string(),
        };

        self.clicks.record(new_click).await?;
        counter!("linkcentral_clicks_recorded_total").increment(1);

        Ok(TrackOutcome {
            recorded: true,
            set_cookies,
        })
    }
}

/// Marker key for the dedup window. The IP is hashed so raw addresses never
/// land in the shared store.
fn dedup_key(link_id: i64, ip: &str) -> String {
    let digest = Sha256::digest(ip.as_bytes());
    format!("click:{}:{}", link_id, hex::encode(digest))
}
