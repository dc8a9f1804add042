//! # Strategy Module
//!
//! Enum-based cache/Store access strategies using dispatch pattern.
//!
//! ## Available Strategies
//!
//! ### Read Strategies
//! - `CacheFirst` - Check cache, fall back to the Store on miss and populate (default)
//! - `StoreOnly` - Skip cache entirely
//!
//! ### Write Strategies
//! - `WriteThrough` - Evict the cache, write the Store, then put the written record (default)
//! - `WriteAround` - Evict the cache, write the Store, leave the cache empty
//!
//! Both write strategies evict *before* the Store call. An invalidation
//! issued after the write would leave a window in which a concurrent reader
//! repopulates the cache with a value that is about to become stale.
//!
//! ## Example
//!
//! ```rust,ignore
//! use customer_persistence::strategy::{ReadStrategy, WriteStrategy};
//!
//! let found = ReadStrategy::CacheFirst
//!     .read(|| cache_lookup(id), || store.find_by_id(id), Some(|c| cache_put(c)))
//!     .await?;
//!
//! let saved = WriteStrategy::WriteThrough
//!     .write(cache.as_ref(), || store.save(customer))
//!     .await?;
//! ```

pub mod read_strategy;
pub mod write_strategy;

pub use read_strategy::ReadStrategy;
pub use write_strategy::{WriteStrategy, Written};
