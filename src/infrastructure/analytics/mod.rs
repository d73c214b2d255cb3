//! Outbound analytics integrations.

pub mod ga;

pub use ga::GaClient;
