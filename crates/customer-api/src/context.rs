//! # API Context
//!
//! Application state and backend wiring for the HTTP handlers.

use std::sync::Arc;

use customer_persistence::{
    CachedCustomerService, CustomerRepository, InMemoryCustomerRepository, MemoryCache,
    ServiceConfig, SharedCache,
};

use crate::config::{CacheBackend, Config, StoreBackend};
use crate::error::ApiResult;

/// Application context shared across all handlers
#[derive(Clone)]
pub struct ApiContext {
    /// Cache-consistent customer service
    pub customers: CachedCustomerService,
}

impl ApiContext {
    /// Wrap an already-built service
    pub fn new(customers: CachedCustomerService) -> Self {
        Self { customers }
    }

    /// In-process Store and cache, for tests and local runs
    pub fn in_memory(config: ServiceConfig) -> Self {
        Self::new(customer_persistence::in_memory_service(config))
    }

    /// Connect the backends named in `config`
    pub async fn connect(config: &Config) -> ApiResult<Self> {
        let store = connect_store(config).await?;
        let cache = connect_cache(config).await?;
        Ok(Self::new(CachedCustomerService::with_config(
            store,
            cache,
            config.service,
        )))
    }
}

async fn connect_store(config: &Config) -> ApiResult<Arc<dyn CustomerRepository>> {
    match config.store {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory customer store");
            Ok(Arc::new(InMemoryCustomerRepository::new()))
        }
        #[cfg(feature = "scylla")]
        StoreBackend::Scylla => {
            use customer_persistence::{ScyllaClient, ScyllaConfig, ScyllaCustomerRepository};

            tracing::info!(
                hosts = ?config.scylla.hosts,
                keyspace = %config.scylla.keyspace,
                "Connecting to ScyllaDB"
            );
            let client = ScyllaClient::new(ScyllaConfig {
                hosts: config.scylla.hosts.clone(),
                keyspace: config.scylla.keyspace.clone(),
                username: config.scylla.username.clone(),
                password: config.scylla.password.clone(),
            })
            .await?;
            client.ensure_schema().await?;
            tracing::info!("ScyllaDB connected");
            Ok(Arc::new(ScyllaCustomerRepository::new(Arc::new(client))))
        }
        #[cfg(not(feature = "scylla"))]
        StoreBackend::Scylla => Err(crate::config::ConfigError::BackendUnavailable {
            backend: "scylla",
            feature: "scylla",
        }
        .into()),
    }
}

async fn connect_cache(config: &Config) -> ApiResult<SharedCache> {
    match config.cache {
        CacheBackend::Memory => {
            tracing::info!("Using in-memory customer cache");
            Ok(Arc::new(MemoryCache::new()))
        }
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            use customer_persistence::{CacheConfig, RedisCache};

            tracing::info!(
                url = %config.redis.url,
                namespace = %config.redis.namespace,
                "Connecting to Redis"
            );
            let cache = RedisCache::new(CacheConfig {
                url: config.redis.url.clone(),
                namespace: config.redis.namespace.clone(),
            })
            .await?;
            tracing::info!("Redis connected");
            Ok(Arc::new(cache))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => Err(crate::config::ConfigError::BackendUnavailable {
            backend: "redis",
            feature: "redis",
        }
        .into()),
    }
}
