//! In-process TTL store.
//!
//! Used when Redis is not configured, and by tests. Dedup markers become
//! per-process in a multi-instance deployment — acceptable for a best-effort
//! guarantee, and the single-instance default gets full fidelity.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::store::{KvResult, TtlStore};

/// Entries above this count trigger an expired-entry sweep on insert.
const SWEEP_THRESHOLD: usize = 1024;

/// Mutex-guarded map with lazy expiry.
pub struct MemoryTtlStore {
    inner: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTtlStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut map = self.inner.lock().expect("ttl store lock poisoned");

        match map.get(key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                map.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        let mut map = self.inner.lock().expect("ttl store lock poisoned");

        if map.len() >= SWEEP_THRESHOLD {
            let now = Instant::now();
            map.retain(|_, (_, expires_at)| *expires_at > now);
        }

        map.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryTtlStore::new();
        store
            .put("click:1:abcd", "1", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(
            store.get("click:1:abcd").await.unwrap(),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = MemoryTtlStore::new();
        store
            .put("short-lived", "1", Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("short-lived").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_ttl() {
        let store = MemoryTtlStore::new();
        store
            .put("key", "old", Duration::from_millis(20))
            .await
            .unwrap();
        store.put("key", "new", Duration::from_secs(5)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("key").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryTtlStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }
}
