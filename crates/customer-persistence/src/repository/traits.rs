//! # Repository Traits
//!
//! Abstract Store interface for customer records.
//! Implementations can be swapped for different backends (in-memory, ScyllaDB, mock, etc.)

use async_trait::async_trait;

use crate::error::Result;
use customer_domain::{Customer, CustomerId};

// =============================================================================
// CUSTOMER REPOSITORY
// =============================================================================

/// Durable CRUD over customer records.
///
/// The cache layer treats this as a black box: every failure surfaces as
/// [`PersistenceError::Store`](crate::PersistenceError::Store).
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Get every customer
    async fn find_all(&self) -> Result<Vec<Customer>>;

    /// Get customer by ID
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>>;

    /// Get customers by email (zero or more, email is not unique)
    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>>;

    /// Check whether a customer exists
    async fn exists_by_id(&self, id: &CustomerId) -> Result<bool>;

    /// Insert when `id` is unset, overwrite otherwise.
    ///
    /// Returns the persisted record including any Store-assigned id.
    async fn save(&self, customer: Customer) -> Result<Customer>;

    /// Delete customer. No-op when absent.
    async fn delete_by_id(&self, id: &CustomerId) -> Result<()>;
}
