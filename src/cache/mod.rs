//! Read-through cache in front of the aggregate queries.
//!
//! Cached values are derived entirely from table state and are never
//! the source of truth: reads that fail for any reason degrade to a
//! miss, writes and invalidations are best-effort. The one hard rule
//! lives with the callers: every mutation that touches orders or stock
//! invalidates the affected keys before reporting success.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

pub mod redis;

pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Cache keys with their fixed TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    DashboardInfo,
    InventoryStatus,
    RevisionInfo,
    LatestOrder,
}

impl CacheKey {
    pub fn key(self) -> &'static str {
        match self {
            CacheKey::DashboardInfo => "dashboard_info",
            CacheKey::InventoryStatus => "inventory_status",
            CacheKey::RevisionInfo => "revision_info",
            CacheKey::LatestOrder => "latest_order_info",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            CacheKey::DashboardInfo | CacheKey::InventoryStatus => Duration::from_secs(600),
            CacheKey::RevisionInfo | CacheKey::LatestOrder => Duration::from_secs(3600),
        }
    }
}

/// Keys that go stale whenever an order commits or cancels.
pub const MUTATION_KEYS: [CacheKey; 3] = [
    CacheKey::DashboardInfo,
    CacheKey::InventoryStatus,
    CacheKey::LatestOrder,
];

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache backend used when no external store is configured.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = {
            let store = self.store.read().unwrap();
            match store.get(key) {
                Some(entry) if Instant::now() <= entry.expires_at => {
                    return Ok(Some(entry.value.clone()))
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.store.write().unwrap().remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut store = self.store.write().unwrap();
        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().unwrap().remove(key);
        Ok(())
    }
}

/// Typed facade over a [`CacheBackend`].
#[derive(Clone)]
pub struct AppCache {
    backend: Arc<dyn CacheBackend>,
}

impl AppCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCache::new()))
    }

    /// Best-effort read. Backend failures and undecodable payloads are
    /// logged and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        match self.backend.get(key.key()).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(key = key.key(), "cache hit");
                    Some(value)
                }
                Err(err) => {
                    tracing::warn!(key = key.key(), error = %err, "cache entry undecodable, treating as miss");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(key = key.key(), "cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(key = key.key(), error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Best-effort write with the key's fixed TTL.
    pub async fn put<T: Serialize>(&self, key: CacheKey, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key = key.key(), error = %err, "cache value unserializable, skipping write");
                return;
            }
        };
        if let Err(err) = self.backend.set(key.key(), &raw, key.ttl()).await {
            tracing::warn!(key = key.key(), error = %err, "cache write failed");
        }
    }

    /// Best-effort invalidation of a set of keys.
    pub async fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            if let Err(err) = self.backend.delete(key.key()).await {
                tracing::warn!(key = key.key(), error = %err, "cache invalidation failed");
            } else {
                tracing::debug!(key = key.key(), "cache invalidated");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        count: u32,
    }

    #[tokio::test]
    async fn roundtrip_and_invalidate() {
        let cache = AppCache::in_memory();
        cache.put(CacheKey::DashboardInfo, &Sample { count: 3 }).await;
        assert_eq!(
            cache.get::<Sample>(CacheKey::DashboardInfo).await,
            Some(Sample { count: 3 })
        );

        cache.invalidate(&[CacheKey::DashboardInfo]).await;
        assert_eq!(cache.get::<Sample>(CacheKey::DashboardInfo).await, None);
    }

    #[tokio::test]
    async fn expired_entries_read_as_miss() {
        let backend = InMemoryCache::new();
        backend
            .set("dashboard_info", "{\"count\":1}", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(backend.get("dashboard_info").await.unwrap(), None);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let cache = AppCache::in_memory();
        cache
            .backend
            .set("dashboard_info", "not json", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get::<Sample>(CacheKey::DashboardInfo).await, None);
    }

    struct BrokenBackend;

    #[async_trait::async_trait]
    impl CacheBackend for BrokenBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn backend_failures_never_propagate() {
        let cache = AppCache::new(Arc::new(BrokenBackend));
        assert_eq!(cache.get::<Sample>(CacheKey::LatestOrder).await, None);
        cache.put(CacheKey::LatestOrder, &Sample { count: 1 }).await;
        cache.invalidate(&MUTATION_KEYS).await;
    }
}
