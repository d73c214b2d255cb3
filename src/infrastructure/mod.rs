//! Infrastructure layer: database, TTL store, geolocation, analytics delivery.

pub mod analytics;
pub mod geo;
pub mod keyvalue;
pub mod persistence;
