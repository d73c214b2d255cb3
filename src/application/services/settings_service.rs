//! Settings snapshot with a short-lived process-wide cache.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::domain::entities::Settings;
use crate::domain::repositories::SettingsRepository;
use crate::error::AppError;

/// How long a loaded snapshot stays fresh. Saves invalidate immediately;
/// out-of-band database edits are picked up within this window.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Caching facade over the settings repository.
///
/// Handlers call [`Self::current`] once per request and pass the snapshot
/// down; settings are immutable within a request by construction.
pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
    cache: RwLock<Option<(Settings, Instant)>>,
    ttl: Duration,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepository>) -> Self {
        Self {
            repository,
            cache: RwLock::new(None),
            ttl: CACHE_TTL,
        }
    }

    /// Overrides the cache TTL; used by tests.
    #[cfg(test)]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the current settings snapshot, loading from storage when the
    /// cached copy is stale.
    pub async fn current(&self) -> Result<Settings, AppError> {
        {
            let cache = self.cache.read().expect("settings cache lock poisoned");
            if let Some((settings, loaded_at)) = cache.as_ref()
                && loaded_at.elapsed() < self.ttl
            {
                return Ok(settings.clone());
            }
        }

        let settings = self.repository.load().await?;

        let mut cache = self.cache.write().expect("settings cache lock poisoned");
        *cache = Some((settings.clone(), Instant::now()));

        Ok(settings)
    }

    /// Validates, persists, and caches a new settings document.
    pub async fn save(&self, settings: Settings) -> Result<Settings, AppError> {
        let settings = settings.normalized();

        settings
            .validate()
            .map_err(|reason| AppError::bad_request("Invalid settings", json!({ "reason": reason })))?;

        self.repository.save(&settings).await?;

        let mut cache = self.cache.write().expect("settings cache lock poisoned");
        *cache = Some((settings.clone(), Instant::now()));

        Ok(settings)
    }
}
