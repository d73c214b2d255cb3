//! TTL key-value store trait and error types.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value store connection error: {0}")]
    Connection(String),
    #[error("key-value store operation error: {0}")]
    Operation(String),
}

/// Result type for store operations.
pub type KvResult<T> = Result<T, KvError>;

/// A keyed store with per-entry expiry.
///
/// Holds the short-lived click-dedup markers. Implementations must be
/// thread-safe; callers treat read/write failures as "marker absent" so a
/// degraded store never blocks recording.
///
/// # Implementations
///
/// - [`crate::infrastructure::keyvalue::RedisTtlStore`] - Redis-backed, shared across processes
/// - [`crate::infrastructure::keyvalue::MemoryTtlStore`] - in-process fallback
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Returns the live value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()>;

    /// Reports whether the backing store is reachable.
    async fn health_check(&self) -> bool;
}
