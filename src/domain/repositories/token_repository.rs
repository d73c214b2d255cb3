//! Repository trait for API token storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// A stored API token. Only the HMAC of the raw token is persisted.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: i64,
    pub name: String,
    pub token_hash: String,
    /// Role granted to callers of this token (e.g. `administrator`, `editor`).
    pub role: String,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Repository interface for API tokens.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTokenRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Stores a new token hash.
    async fn create(&self, name: &str, token_hash: &str, role: &str)
    -> Result<TokenRecord, AppError>;

    /// Finds a non-revoked token by its hash.
    async fn find_active_by_hash(&self, token_hash: &str)
    -> Result<Option<TokenRecord>, AppError>;

    /// Updates the last-used timestamp for auditing.
    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError>;

    /// Lists all tokens, including revoked ones.
    async fn list(&self) -> Result<Vec<TokenRecord>, AppError>;

    /// Revokes a token by name. Returns `Ok(true)` when a row was updated.
    async fn revoke(&self, name: &str) -> Result<bool, AppError>;
}
