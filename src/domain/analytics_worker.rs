//! Background worker draining the analytics forwarding queue.
//!
//! The redirect path never awaits delivery: events ride a bounded channel and
//! are posted here one at a time. Delivery failures are counted and otherwise
//! swallowed — analytics forwarding is best-effort by contract.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::analytics_event::AnalyticsEvent;

/// Delivery failure for a single analytics event.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("analytics request failed: {0}")]
    Request(String),
    #[error("analytics endpoint returned status {0}")]
    Status(u16),
}

/// Delivers one analytics event to the external endpoint.
///
/// Implementations must enforce their own short timeout; the worker applies
/// no deadline of its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsForwarder: Send + Sync {
    async fn forward(&self, event: &AnalyticsEvent) -> Result<(), ForwardError>;
}

/// Runs until the sending side of the channel is dropped.
pub async fn run_analytics_worker(
    mut rx: mpsc::Receiver<AnalyticsEvent>,
    forwarder: Arc<dyn AnalyticsForwarder>,
) {
    while let Some(event) = rx.recv().await {
        match forwarder.forward(&event).await {
            Ok(()) => {
                counter!("linkcentral_analytics_forwarded_total").increment(1);
            }
            Err(e) => {
                debug!(link_id = event.link_id, "analytics forwarding failed: {e}");
                counter!("linkcentral_analytics_failed_total").increment(1);
            }
        }
    }
}
