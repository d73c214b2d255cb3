//! Country lookup against ip-api.com with an in-process cache.

use dashmap::DashMap;
use serde::Deserialize;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Lookup timeout; a slow geolocation answer must not stall rule matching
/// for longer than this.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

/// HTTP client for ip-api.com country lookups.
///
/// Caches results per IP, including failed lookups (`None`), so one visitor
/// costs at most one network round trip.
pub struct IpApiClient {
    client: Option<reqwest::Client>,
    cache: Arc<DashMap<String, Option<String>>>,
    endpoint: String,
}

impl IpApiClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| debug!("failed to build geo HTTP client: {e}"))
            .ok();

        Self {
            client,
            cache: Arc::new(DashMap::new()),
            endpoint: "http://ip-api.com".to_string(),
        }
    }

    /// Overrides the API endpoint; used by tests.
    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Resolves `ip` to an ISO country code.
    ///
    /// Returns `None` for private/loopback addresses, unparseable input,
    /// failed or rate-limited API responses, and previously-failed lookups.
    pub async fn lookup(&self, ip: &str) -> Option<String> {
        if is_private(ip) {
            return None;
        }

        if let Some(entry) = self.cache.get(ip) {
            return entry.clone();
        }

        let result = self.fetch_country(ip).await;

        // Cache failures too so unresolvable IPs are not retried per click.
        self.cache.insert(ip.to_owned(), result.clone());

        result
    }

    async fn fetch_country(&self, ip: &str) -> Option<String> {
        let client = self.client.as_ref()?;
        let url = format!("{}/json/{}?fields=status,countryCode", self.endpoint, ip);

        let resp = client
            .get(&url)
            .send()
            .await
            .map_err(|e| debug!("geo lookup network error for {ip}: {e}"))
            .ok()?;

        let body: IpApiResponse = resp
            .json()
            .await
            .map_err(|e| debug!("geo lookup parse error for {ip}: {e}"))
            .ok()?;

        if body.status != "success" {
            debug!("geo lookup returned non-success status for {ip}");
            return None;
        }

        body.country_code
            .filter(|code| !code.is_empty())
            .map(|code| code.to_ascii_uppercase())
    }
}

impl Default for IpApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Addresses that should never be sent to a public geolocation API:
/// loopback, link-local, private ranges, and IPv6 special addresses.
fn is_private(ip_str: &str) -> bool {
    // Strip IPv6-mapped IPv4 prefix: "::ffff:1.2.3.4" → "1.2.3.4"
    let ip_str = ip_str.strip_prefix("::ffff:").unwrap_or(ip_str);

    match IpAddr::from_str(ip_str) {
        Ok(IpAddr::V4(addr)) => {
            let octets = addr.octets();
            addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_broadcast()
                || octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
        }
        Ok(IpAddr::V6(addr)) => {
            addr.is_loopback()
                || addr.is_unspecified()
                || (addr.segments()[0] & 0xffc0) == 0xfe80
                || (addr.segments()[0] & 0xfe00) == 0xfc00
        }
        Err(_) => true, // unparseable → skip
    }
}
