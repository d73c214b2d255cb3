//! PostgreSQL implementation of the settings repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

use crate::domain::entities::Settings;
use crate::domain::repositories::SettingsRepository;
use crate::error::AppError;

/// PostgreSQL repository for the single-row settings document.
pub struct PgSettingsRepository {
    pool: Arc<PgPool>,
}

impl PgSettingsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn load(&self) -> Result<Settings, AppError> {
        let document: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT document FROM settings WHERE id = 1")
                .fetch_optional(self.pool.as_ref())
                .await?;

        let Some(document) = document else {
            return Ok(Settings::default());
        };

        // A document written by a newer version may carry keys we don't know;
        // serde ignores them. A wholly unparseable document falls back to
        // defaults rather than taking redirects down.
        Ok(serde_json::from_value(document).unwrap_or_else(|e| {
            warn!("unparseable settings document, using defaults: {e}");
            Settings::default()
        }))
    }

    async fn save(&self, settings: &Settings) -> Result<(), AppError> {
        let document = serde_json::to_value(settings).map_err(|e| {
            AppError::internal(
                "Failed to serialize settings",
                serde_json::json!({ "reason": e.to_string() }),
            )
        })?;

        sqlx::query(
            "INSERT INTO settings (id, document) VALUES (1, $1) \
             ON CONFLICT (id) DO UPDATE SET document = $1, updated_at = now()",
        )
        .bind(document)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
