//! PostgreSQL implementation of the API token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{TokenRecord, TokenRepository};
use crate::error::AppError;

const TOKEN_COLUMNS: &str = "id, name, token_hash, role, revoked, created_at, last_used_at";

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    name: String,
    token_hash: String,
    role: String,
    revoked: bool,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for TokenRecord {
    fn from(row: TokenRow) -> Self {
        TokenRecord {
            id: row.id,
            name: row.name,
            token_hash: row.token_hash,
            role: row.role,
            revoked: row.revoked,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

/// PostgreSQL repository for API tokens.
pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn create(
        &self,
        name: &str,
        token_hash: &str,
        role: &str,
    ) -> Result<TokenRecord, AppError> {
        let query = format!(
            "INSERT INTO api_tokens (name, token_hash, role) VALUES ($1, $2, $3) \
             RETURNING {TOKEN_COLUMNS}"
        );

        let row: TokenRow = sqlx::query_as(&query)
            .bind(name)
            .bind(token_hash)
            .bind(role)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_active_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TokenRecord>, AppError> {
        let query = format!(
            "SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE token_hash = $1 AND NOT revoked"
        );

        let row: Option<TokenRow> = sqlx::query_as(&query)
            .bind(token_hash)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(TokenRecord::from))
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE api_tokens SET last_used_at = now() WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<TokenRecord>, AppError> {
        let query = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens ORDER BY created_at DESC");

        let rows: Vec<TokenRow> = sqlx::query_as(&query)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(TokenRecord::from).collect())
    }

    async fn revoke(&self, name: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE api_tokens SET revoked = TRUE WHERE name = $1")
            .bind(name)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
