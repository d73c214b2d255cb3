//! PostgreSQL repository implementations.

pub mod pg_click_repository;
pub mod pg_link_repository;
pub mod pg_settings_repository;
pub mod pg_token_repository;

pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_settings_repository::PgSettingsRepository;
pub use pg_token_repository::PgTokenRepository;
