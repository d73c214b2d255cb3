//! HTTP request handlers.

pub mod health;
pub mod links;
pub mod redirect;
pub mod settings;
pub mod stats;

pub use health::health_handler;
pub use redirect::{password_handler, redirect_handler};
