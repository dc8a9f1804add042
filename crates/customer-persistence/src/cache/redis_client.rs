//! # Redis Cache Layer
//!
//! Customer cache stored as a single Redis hash per namespace. Fields are
//! [`CacheKey::as_field`] strings and values are JSON [`CacheEntry`]s.
//! `evict_all` drops the whole hash with one `DEL`, so it is atomic on the
//! server like every other call.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use super::traits::{CacheEntry, CacheKey, CustomerCache};
use crate::error::Result;

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    /// Name of the hash holding every entry.
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            namespace: "customers".to_string(),
        }
    }
}

/// Redis-backed customer cache
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    config: CacheConfig,
}

impl RedisCache {
    /// Connect to Redis
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn, config })
    }
}

#[async_trait]
impl CustomerCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(&self.config.namespace, key.as_field()).await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&entry)?;
        let _: () = conn.hset(&self.config.namespace, key.as_field(), json).await?;
        Ok(())
    }

    async fn evict(&self, key: &CacheKey) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.hdel(&self.config.namespace, key.as_field()).await?;
        Ok(())
    }

    async fn evict_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(&self.config.namespace).await?;
        Ok(())
    }
}
