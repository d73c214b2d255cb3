//! Business-logic services orchestrating repositories and collaborators.

pub mod auth_service;
pub mod click_service;
pub mod link_service;
pub mod redirect_service;
pub mod settings_service;
pub mod stats_service;

pub use auth_service::{AuthContext, AuthService};
pub use click_service::ClickService;
pub use link_service::LinkService;
pub use redirect_service::{RedirectOutcome, RedirectService};
pub use settings_service::SettingsService;
pub use stats_service::StatsService;
