//! Redis-backed TTL store.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{info, warn};

use super::store::{KvError, KvResult, TtlStore};

/// Redis implementation sharing dedup markers across all service instances.
///
/// Uses `ConnectionManager` for connection reuse and reconnects. Operations
/// are fail-open: errors surface as `None`/no-op after being logged, so a
/// Redis outage degrades dedup rather than redirects.
pub struct RedisTtlStore {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisTtlStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> KvResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url)
            .map_err(|e| KvError::Connection(format!("Failed to create Redis client: {e}")))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| KvError::Connection(format!("Failed to connect to Redis: {e}")))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| KvError::Connection(format!("Redis PING failed: {e}")))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            key_prefix: "lc:".to_string(),
        })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl TtlStore for RedisTtlStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let key = self.build_key(key);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Redis GET error for {key}: {e}");
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        let key = self.build_key(key);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        if let Err(e) = conn.set_ex::<_, _, ()>(&key, value, ttl_seconds).await {
            warn!("Redis SETEX error for {key}: {e}");
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
