//! Redis cache backend.
//!
//! Used when `cache.backend = "redis"` is configured; the connection
//! manager transparently reconnects, and any command failure surfaces
//! as a [`CacheError`] that the facade downgrades to a miss.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::{CacheBackend, CacheError};

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Backend(format!("invalid redis url: {}", e)))?;
        let conn = client
            .get_tokio_connection_manager()
            .await
            .map_err(|e| CacheError::Backend(format!("redis connect failed: {}", e)))?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl.as_secs() as usize)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}
