//! # Customer Persistence Library
//!
//! Cache-consistent persistence layer for the customer-record service.
//!
//! ## Architecture
//!
//! This crate implements the Repository pattern with pluggable Strategy pattern
//! for cache/Store access:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application Layer                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  CachedCustomerService                       │
//! │     (evict-before-write ordering via read/write strategies)  │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │     CustomerCache       │   │     CustomerRepository       │
//! │   (memory / Redis)      │   │  (Source of Truth: memory /  │
//! │                         │   │   ScyllaDB)                  │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `redis`: Enable the Redis cache backend (default)
//! - `scylla`: Enable the ScyllaDB Store backend
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use customer_persistence::{CachedCustomerService, InMemoryCustomerRepository, MemoryCache};
//!
//! let service = CachedCustomerService::new(
//!     Arc::new(InMemoryCustomerRepository::new()),
//!     Arc::new(MemoryCache::new()),
//! );
//!
//! let alice = service.create_customer(details).await?;
//! let cached = service.get_customer_by_id(alice.id.as_ref().unwrap()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod repository;
pub mod service;
pub mod strategy;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheKey, CacheStats, CustomerCache, MemoryCache, SharedCache};
#[cfg(feature = "redis")]
pub use cache::{CacheConfig, RedisCache};
pub use error::{PersistenceError, Result};
pub use repository::{CustomerRepository, InMemoryCustomerRepository, StoreCallCounts};
#[cfg(feature = "scylla")]
pub use repository::{ScyllaClient, ScyllaConfig, ScyllaCustomerRepository};
pub use service::{CachedCustomerService, ServiceConfig};
pub use strategy::{ReadStrategy, WriteStrategy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service over an in-process Store and cache.
#[must_use]
pub fn in_memory_service(config: ServiceConfig) -> CachedCustomerService {
    CachedCustomerService::with_config(
        std::sync::Arc::new(InMemoryCustomerRepository::new()),
        std::sync::Arc::new(MemoryCache::new()),
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_service_starts_empty() {
        let service = in_memory_service(ServiceConfig::default());
        assert!(service.get_all_customers().await.unwrap().is_empty());
    }
}
