//! Repository traits decoupling business logic from storage.

pub mod click_repository;
pub mod link_repository;
pub mod settings_repository;
pub mod token_repository;

pub use click_repository::{ClickPage, ClickRepository, DailyClicks, LinkTotals};
pub use link_repository::LinkRepository;
pub use settings_repository::SettingsRepository;
pub use token_repository::{TokenRecord, TokenRepository};

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use settings_repository::MockSettingsRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
