//! In-process customer cache.
//!
//! A `HashMap` behind a `tokio::sync::RwLock`. The lock is held for the
//! duration of a single call only and never across a Store round trip.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::{CacheEntry, CacheKey, CustomerCache};
use crate::error::Result;

/// Cache counters snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub evictions: u64,
    pub clears: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// In-memory customer cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    evictions: AtomicU64,
    clears: AtomicU64,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }

    /// Whether `key` currently has an entry. Does not touch the counters.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CustomerCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let entry = self.entries.read().await.get(key).cloned();
        let counter = if entry.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(entry)
    }

    async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<()> {
        self.entries.write().await.insert(key, entry);
        self.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn evict(&self, key: &CacheKey) -> Result<()> {
        self.entries.write().await.remove(key);
        self.evictions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn evict_all(&self) -> Result<()> {
        self.entries.write().await.clear();
        self.clears.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
