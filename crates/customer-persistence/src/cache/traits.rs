//! Cache keys, entries and the backend trait.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use customer_domain::{Customer, CustomerId};

/// Key into the customer cache.
///
/// `All` is the reserved "all records" scope. It is only ever evicted as an
/// invalidation trigger and never holds the full record list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Customer(CustomerId),
    All,
}

impl CacheKey {
    /// Field name used by string-keyed backends.
    pub const ALL_FIELD: &'static str = "all";

    pub fn customer(id: &CustomerId) -> Self {
        Self::Customer(id.clone())
    }

    /// Render as a backend field name. Customer ids are prefixed so no id
    /// can collide with the `all` sentinel.
    #[must_use]
    pub fn as_field(&self) -> String {
        match self {
            Self::Customer(id) => format!("id:{id}"),
            Self::All => Self::ALL_FIELD.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_field())
    }
}

/// Value stored under a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CacheEntry {
    Customer(Customer),
    /// Presence marker for the `All` scope.
    Marker,
}

impl CacheEntry {
    #[must_use]
    pub fn into_customer(self) -> Option<Customer> {
        match self {
            Self::Customer(customer) => Some(customer),
            Self::Marker => None,
        }
    }
}

/// Thread-safe key/value cache in front of the customer Store.
///
/// Each call is atomic on its own; no ordering is promised between
/// concurrent calls. Sequencing is the service layer's job.
#[async_trait]
pub trait CustomerCache: Send + Sync {
    /// Look up a key. `Ok(None)` means "not cached".
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Unconditional overwrite, last writer wins.
    async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<()>;

    /// Remove a key. No-op when absent.
    async fn evict(&self, key: &CacheKey) -> Result<()>;

    /// Remove every entry, the `All` sentinel included.
    async fn evict_all(&self) -> Result<()>;
}

/// Shared cache handle
pub type SharedCache = Arc<dyn CustomerCache>;
