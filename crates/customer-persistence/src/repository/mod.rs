//! # Repository Module
//!
//! Store implementations for customer persistence.

pub mod memory_impl;
#[cfg(feature = "scylla")]
pub mod scylla_impl;
pub mod traits;

pub use memory_impl::{InMemoryCustomerRepository, StoreCallCounts};
#[cfg(feature = "scylla")]
pub use scylla_impl::{ScyllaClient, ScyllaConfig, ScyllaCustomerRepository};
pub use traits::CustomerRepository;
