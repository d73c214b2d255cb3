//! Repository trait for the settings document.

use async_trait::async_trait;

use crate::domain::entities::Settings;
use crate::error::AppError;

/// Repository interface for loading and replacing the settings document.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgSettingsRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Loads the current settings. Missing keys take their defaults, so a
    /// freshly-initialized row yields `Settings::default()`.
    async fn load(&self) -> Result<Settings, AppError>;

    /// Replaces the settings document atomically.
    async fn save(&self, settings: &Settings) -> Result<(), AppError>;
}
