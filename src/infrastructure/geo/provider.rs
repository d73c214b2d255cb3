//! Visitor-country resolution for rule matching.

use async_trait::async_trait;

use crate::application::request_context::RequestContext;
use crate::domain::entities::GeolocationService;
use crate::infrastructure::geo::ip_api::IpApiClient;

/// Resolves the visitor's country code for the configured backend.
///
/// Returns `None` whenever the country cannot be determined — the rule
/// matcher treats a missing country as "no country condition can match".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn country(&self, service: GeolocationService, ctx: &RequestContext) -> Option<String>;
}

/// Production resolver covering all backends.
pub struct GeoResolver {
    ip_api: IpApiClient,
}

impl GeoResolver {
    pub fn new() -> Self {
        Self {
            ip_api: IpApiClient::new(),
        }
    }
}

impl Default for GeoResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoProvider for GeoResolver {
    async fn country(&self, service: GeolocationService, ctx: &RequestContext) -> Option<String> {
        match service {
            GeolocationService::None => None,
            GeolocationService::Header => {
                let code = ctx.country_header.as_deref()?.trim().to_ascii_uppercase();
                // Cloudflare sends XX for unknown and T1 for Tor exits;
                // neither is a country.
                if code.len() != 2 || code == "XX" || code == "T1" {
                    return None;
                }
                Some(code)
            }
            GeolocationService::IpApi => self.ip_api.lookup(ctx.ip.as_deref()?).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(ip: Option<&str>, country_header: Option<&str>) -> RequestContext {
        RequestContext {
            ip: ip.map(str::to_string),
            country_header: country_header.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_none_service_resolves_nothing() {
        let resolver = GeoResolver::new();
        let country = resolver
            .country(GeolocationService::None, &ctx(Some("203.0.113.7"), Some("NL")))
            .await;
        assert_eq!(country, None);
    }

    #[tokio::test]
    async fn test_header_service_uses_edge_header() {
        let resolver = GeoResolver::new();

        let country = resolver
            .country(GeolocationService::Header, &ctx(None, Some("nl")))
            .await;
        assert_eq!(country, Some("NL".to_string()));

        let missing = resolver
            .country(GeolocationService::Header, &ctx(None, None))
            .await;
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_header_service_rejects_sentinel_codes() {
        let resolver = GeoResolver::new();

        for bogus in ["XX", "T1", "", "NLD"] {
            let country = resolver
                .country(GeolocationService::Header, &ctx(None, Some(bogus)))
                .await;
            assert_eq!(country, None, "header {bogus:?} should not resolve");
        }
    }

    #[tokio::test]
    async fn test_ip_api_without_ip_resolves_nothing() {
        let resolver = GeoResolver::new();
        let country = resolver
            .country(GeolocationService::IpApi, &ctx(None, None))
            .await;
        assert_eq!(country, None);
    }
}
