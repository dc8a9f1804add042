//! In-process Store implementation.
//!
//! Backs the service in tests and single-node deployments. Every Store
//! call is counted so callers can verify exactly which operations reached
//! the Store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::CustomerRepository;
use crate::error::{PersistenceError, Result};
use customer_domain::{Customer, CustomerId};

/// Snapshot of how many times each Store operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCallCounts {
    pub find_all: u64,
    pub find_by_id: u64,
    pub find_by_email: u64,
    pub exists_by_id: u64,
    pub save: u64,
    pub delete_by_id: u64,
}

impl StoreCallCounts {
    /// Total calls across all operations.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.find_all
            + self.find_by_id
            + self.find_by_email
            + self.exists_by_id
            + self.save
            + self.delete_by_id
    }
}

#[derive(Debug, Default)]
struct Counters {
    find_all: AtomicU64,
    find_by_id: AtomicU64,
    find_by_email: AtomicU64,
    exists_by_id: AtomicU64,
    save: AtomicU64,
    delete_by_id: AtomicU64,
}

/// `BTreeMap` backed customer Store.
#[derive(Debug)]
pub struct InMemoryCustomerRepository {
    records: RwLock<BTreeMap<CustomerId, Customer>>,
    counters: Counters,
    available: AtomicBool,
}

impl Default for InMemoryCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCustomerRepository {
    /// Create an empty Store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            counters: Counters::default(),
            available: AtomicBool::new(true),
        }
    }

    /// Current call counts.
    pub fn call_counts(&self) -> StoreCallCounts {
        let c = &self.counters;
        StoreCallCounts {
            find_all: c.find_all.load(Ordering::Relaxed),
            find_by_id: c.find_by_id.load(Ordering::Relaxed),
            find_by_email: c.find_by_email.load(Ordering::Relaxed),
            exists_by_id: c.exists_by_id.load(Ordering::Relaxed),
            save: c.save.load(Ordering::Relaxed),
            delete_by_id: c.delete_by_id.load(Ordering::Relaxed),
        }
    }

    /// Toggle simulated outage. While unavailable every call fails with
    /// [`PersistenceError::Store`] and leaves the records untouched.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn enter(&self, counter: &AtomicU64, op: &str) -> Result<()> {
        counter.fetch_add(1, Ordering::Relaxed);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PersistenceError::Store(format!("in-memory store offline during {op}")))
        }
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_all(&self) -> Result<Vec<Customer>> {
        self.enter(&self.counters.find_all, "find_all")?;
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>> {
        self.enter(&self.counters.find_by_id, "find_by_id")?;
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>> {
        self.enter(&self.counters.find_by_email, "find_by_email")?;
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|c| c.email == email)
            .cloned()
            .collect())
    }

    async fn exists_by_id(&self, id: &CustomerId) -> Result<bool> {
        self.enter(&self.counters.exists_by_id, "exists_by_id")?;
        Ok(self.records.read().await.contains_key(id))
    }

    async fn save(&self, mut customer: Customer) -> Result<Customer> {
        self.enter(&self.counters.save, "save")?;
        let id = customer.id.get_or_insert_with(CustomerId::generate).clone();
        self.records.write().await.insert(id, customer.clone());
        Ok(customer)
    }

    async fn delete_by_id(&self, id: &CustomerId) -> Result<()> {
        self.enter(&self.counters.delete_by_id, "delete_by_id")?;
        self.records.write().await.remove(id);
        Ok(())
    }
}
