//! Google Analytics Measurement Protocol forwarder.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::domain::analytics_event::AnalyticsEvent;
use crate::domain::analytics_worker::{AnalyticsForwarder, ForwardError};

/// Per-request deadline. The worker posts events off the request path, but a
/// hung endpoint must not back the queue up indefinitely.
const FORWARD_TIMEOUT: Duration = Duration::from_secs(1);

/// HTTP client posting `outbound_link_click` events to GA4.
pub struct GaClient {
    client: Option<reqwest::Client>,
    endpoint: String,
}

impl GaClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .build()
            .map_err(|e| debug!("failed to build analytics HTTP client: {e}"))
            .ok();

        Self {
            client,
            endpoint: "https://www.google-analytics.com".to_string(),
        }
    }

    /// Overrides the collection endpoint; used by tests.
    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for GaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticsForwarder for GaClient {
    async fn forward(&self, event: &AnalyticsEvent) -> Result<(), ForwardError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ForwardError::Request("HTTP client unavailable".to_string()))?;

        let url = format!(
            "{}/mp/collect?measurement_id={}&api_secret={}",
            self.endpoint, event.measurement_id, event.api_secret
        );

        let body = json!({
            "client_id": event.client_id,
            "timestamp_micros": Utc::now().timestamp_micros(),
            "events": [{
                "name": "outbound_link_click",
                "params": {
                    "link_url": event.link_url,
                    "link_title": event.link_title,
                    "link_id": event.link_id,
                    "destination_url": event.destination_url,
                    "plugin": "LinkCentral",
                },
            }],
        });

        let response = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForwardError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::Status(status.as_u16()));
        }

        Ok(())
    }
}
