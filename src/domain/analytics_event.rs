//! Analytics event model for asynchronous forwarding.

/// An outbound-click event queued for delivery to the analytics endpoint.
///
/// Created in the click recorder and passed to the background worker via a
/// bounded channel, decoupling the redirect response from the network call.
/// Credentials are captured at enqueue time so a settings change mid-flight
/// cannot mix the measurement id of one configuration with the secret of
/// another.
#[derive(Debug, Clone)]
pub struct AnalyticsEvent {
    pub measurement_id: String,
    pub api_secret: String,
    pub client_id: String,
    pub link_id: i64,
    pub link_title: String,
    /// The public short URL that was clicked.
    pub link_url: String,
    /// The resolved URL the visitor was sent to.
    pub destination_url: String,
}
