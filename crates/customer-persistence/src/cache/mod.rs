//! # Cache Module
//!
//! Id-keyed customer cache with in-process and Redis backends.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_client;
pub mod traits;

pub use memory::{CacheStats, MemoryCache};
#[cfg(feature = "redis")]
pub use redis_client::{CacheConfig, RedisCache};
pub use traits::{CacheEntry, CacheKey, CustomerCache, SharedCache};
