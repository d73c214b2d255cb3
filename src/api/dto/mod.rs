//! Request/response DTOs for the REST API.

pub mod health;
pub mod links;
pub mod stats;
