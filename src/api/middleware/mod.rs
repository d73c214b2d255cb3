//! Middleware for the HTTP surface.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
