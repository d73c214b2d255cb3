//! Authentication service for API token validation and issuance.

use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::repositories::{TokenRecord, TokenRepository};
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Length of generated raw tokens.
const TOKEN_LENGTH: usize = 40;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token_name: String,
    pub role: String,
}

/// Service authenticating API requests via Bearer tokens.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before
/// storage and comparison; a read-only copy of the database cannot be used
/// to forge or verify tokens without the server-side secret.
pub struct AuthService {
    repository: Arc<dyn TokenRepository>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value used when tokens were created.
    pub fn new(repository: Arc<dyn TokenRepository>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Hashes a raw token with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    fn hash_token(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Authenticates a raw token against stored credentials.
    ///
    /// On success, updates the `last_used_at` timestamp for auditing and
    /// returns the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for unknown or revoked tokens.
    pub async fn authenticate(&self, token: &str) -> Result<AuthContext, AppError> {
        let token_hash = self.hash_token(token);

        let record = self
            .repository
            .find_active_by_hash(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "Invalid or revoked token" }),
                )
            })?;

        let _ = self.repository.update_last_used(&token_hash).await;

        Ok(AuthContext {
            token_name: record.name,
            role: record.role,
        })
    }

    /// Issues a new token: generates the raw value, stores its hash, and
    /// returns both. The raw token is shown exactly once.
    pub async fn issue(&self, name: &str, role: &str) -> Result<(TokenRecord, String), AppError> {
        let raw: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        let record = self
            .repository
            .create(name, &self.hash_token(&raw), role)
            .await?;

        Ok((record, raw))
    }
}
