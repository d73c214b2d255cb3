//! Service-wide settings document.
//!
//! Loaded from storage as a single JSON document, cached with a short TTL,
//! and handed to request handlers as an immutable snapshot. Unknown keys in a
//! stored document are ignored; missing keys take their defaults, so older
//! documents keep working after upgrades.

use serde::{Deserialize, Serialize};

use crate::domain::entities::link::{Link, RedirectCode};

/// Geolocation backend used to resolve the visitor country for rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationService {
    /// Country resolution disabled; country conditions never match.
    #[default]
    None,
    /// Trust an edge-provided country header (`CF-IPCountry`).
    Header,
    /// Look the IP up against ip-api.com with an in-process cache.
    IpApi,
}

/// Immutable per-request snapshot of all configurable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Tracking toggles
    pub disable_reporting: bool,
    pub track_ip: bool,
    pub track_user_agent: bool,
    pub track_unique_visitors: bool,

    // Exclusions
    pub excluded_ips: Vec<String>,
    pub excluded_roles: Vec<String>,
    pub exclude_bots: bool,

    // Global link defaults
    pub global_redirection_type: RedirectCode,
    pub global_nofollow: bool,
    pub global_sponsored: bool,
    pub global_parameter_forwarding: bool,

    // Analytics forwarding
    pub ga_enabled: bool,
    pub ga_measurement_id: String,
    pub ga_api_secret: String,

    // Geolocation
    pub geolocation_service: GeolocationService,

    // Retention
    pub enable_data_expiry: bool,
    pub data_expiry_days: u32,
    pub delete_tracking_data_on_link_deletion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            disable_reporting: false,
            track_ip: true,
            track_user_agent: true,
            track_unique_visitors: true,
            excluded_ips: Vec::new(),
            excluded_roles: Vec::new(),
            exclude_bots: false,
            global_redirection_type: RedirectCode::TemporaryRedirect,
            global_nofollow: false,
            global_sponsored: false,
            global_parameter_forwarding: false,
            ga_enabled: false,
            ga_measurement_id: String::new(),
            ga_api_secret: String::new(),
            geolocation_service: GeolocationService::None,
            enable_data_expiry: false,
            data_expiry_days: 90,
            delete_tracking_data_on_link_deletion: false,
        }
    }
}

impl Settings {
    /// Effective redirect status code for a link: the link's explicit choice
    /// or the global default.
    pub fn effective_redirect_code(&self, link: &Link) -> RedirectCode {
        link.redirection_type.unwrap_or(self.global_redirection_type)
    }

    /// Effective query-parameter forwarding for a link.
    pub fn effective_parameter_forwarding(&self, link: &Link) -> bool {
        link.parameter_forwarding
            .resolve(self.global_parameter_forwarding)
    }

    pub fn effective_nofollow(&self, link: &Link) -> bool {
        link.nofollow.resolve(self.global_nofollow)
    }

    pub fn effective_sponsored(&self, link: &Link) -> bool {
        link.sponsored.resolve(self.global_sponsored)
    }

    /// True when analytics forwarding is fully configured.
    pub fn ga_forwarding_active(&self) -> bool {
        self.ga_enabled && !self.ga_measurement_id.is_empty() && !self.ga_api_secret.is_empty()
    }

    /// Normalizes the exclusion lists: trims entries and drops empties.
    pub fn normalized(mut self) -> Self {
        self.excluded_ips = self
            .excluded_ips
            .into_iter()
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .collect();
        self.excluded_roles = self
            .excluded_roles
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }

    /// Validates value ranges the serde layer cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.enable_data_expiry && self.data_expiry_days == 0 {
            return Err("data_expiry_days must be at least 1 when expiry is enabled".to_string());
        }
        Ok(())
    }
}
