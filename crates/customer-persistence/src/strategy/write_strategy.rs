//! Write strategy implementations using enum dispatch.

use std::future::Future;

use crate::cache::{CacheEntry, CacheKey, CustomerCache};
use crate::error::Result;
use customer_domain::Customer;

/// Output of a Store write that may carry a record to cache afterwards.
pub trait Written {
    /// The persisted record, if the write produced one.
    fn written(&self) -> Option<&Customer>;
}

impl Written for Customer {
    fn written(&self) -> Option<&Customer> {
        Some(self)
    }
}

impl Written for Option<Customer> {
    fn written(&self) -> Option<&Customer> {
        self.as_ref()
    }
}

impl Written for bool {
    fn written(&self) -> Option<&Customer> {
        None
    }
}

/// Write strategy enum - determines cache/Store write pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Evict before the Store write, put the written record after it
    #[default]
    WriteThrough,
    /// Evict before the Store write, leave the cache to the next read
    WriteAround,
}

impl WriteStrategy {
    /// Execute a write operation according to the strategy.
    ///
    /// Order is fixed: `evict_all` completes before `store_fn` is invoked.
    /// If that eviction fails the Store is never touched. A failed Store
    /// call returns its error without any cache put.
    pub async fn write<T, StoreFut>(
        &self,
        cache: &dyn CustomerCache,
        store_fn: impl FnOnce() -> StoreFut,
    ) -> Result<T>
    where
        T: Written,
        StoreFut: Future<Output = Result<T>>,
    {
        cache.evict_all().await.inspect_err(|e| {
            tracing::error!(error = %e, "Pre-write invalidation failed, aborting write");
        })?;

        let output = store_fn().await?;

        if *self == Self::WriteThrough {
            if let Some(record) = output.written() {
                Self::populate(cache, record).await;
            }
        }

        Ok(output)
    }

    async fn populate(cache: &dyn CustomerCache, record: &Customer) {
        let Some(id) = record.id.as_ref() else {
            tracing::warn!("Written record has no id, skipping cache put");
            return;
        };
        let key = CacheKey::customer(id);

        if let Err(e) = cache.put(key.clone(), CacheEntry::Customer(record.clone())).await {
            tracing::warn!(error = %e, customer_id = %id, "Failed to write to cache");
            // Leave the key absent rather than possibly stale.
            if let Err(e) = cache.evict(&key).await {
                tracing::warn!(error = %e, customer_id = %id, "Failed to evict after put failure");
            }
        }
    }
}
