//! Geolocation backends for country-based redirect rules.

pub mod ip_api;
pub mod provider;

pub use ip_api::IpApiClient;
pub use provider::{GeoProvider, GeoResolver};

#[cfg(test)]
pub use provider::MockGeoProvider;
