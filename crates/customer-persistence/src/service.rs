//! # Cache-Consistent Customer Service
//!
//! Wraps a [`CustomerRepository`] with an id-keyed [`CustomerCache`].
//!
//! | Operation | Cache effect, in order |
//! |---|---|
//! | `get_all_customers` | none |
//! | `get_customer_by_id` | lookup; on miss read the Store and put if found |
//! | `get_customers_by_email` | none |
//! | `create_customer` | `evict_all`, insert |
//! | `update_customer` | `evict_all`, read + save, put updated record |
//! | `delete_customer` | `evict_all`, `evict(id)`, existence check + delete |
//!
//! Evictions always complete before the Store write they guard. No lock is
//! held across a Store call, and concurrent operations are not serialised
//! against each other.

use std::sync::Arc;

use crate::cache::{CacheEntry, CacheKey, SharedCache};
use crate::error::Result;
use crate::repository::CustomerRepository;
use crate::strategy::{ReadStrategy, WriteStrategy};
use customer_domain::{Customer, CustomerDetails, CustomerId};

/// Service tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Strategy for point reads by id.
    pub read_strategy: ReadStrategy,
    /// Put newly created records into the cache instead of waiting for the
    /// first read.
    pub populate_on_create: bool,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.read_strategy = strategy;
        self
    }

    pub const fn with_populate_on_create(mut self, enabled: bool) -> Self {
        self.populate_on_create = enabled;
        self
    }

    const fn create_strategy(&self) -> WriteStrategy {
        if self.populate_on_create {
            WriteStrategy::WriteThrough
        } else {
            WriteStrategy::WriteAround
        }
    }
}

/// Customer CRUD with a read-through / write-through cache in front of
/// single-record lookups.
#[derive(Clone)]
pub struct CachedCustomerService {
    store: Arc<dyn CustomerRepository>,
    cache: SharedCache,
    config: ServiceConfig,
}

impl CachedCustomerService {
    /// Create a service with default strategies.
    pub fn new(store: Arc<dyn CustomerRepository>, cache: SharedCache) -> Self {
        Self::with_config(store, cache, ServiceConfig::default())
    }

    /// Create with custom strategies.
    pub fn with_config(
        store: Arc<dyn CustomerRepository>,
        cache: SharedCache,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Every customer, straight from the Store.
    pub async fn get_all_customers(&self) -> Result<Vec<Customer>> {
        tracing::info!("Fetching all customers from store");
        self.store.find_all().await
    }

    /// Point lookup through the cache.
    pub async fn get_customer_by_id(&self, id: &CustomerId) -> Result<Option<Customer>> {
        let key = CacheKey::customer(id);

        let found = self
            .config
            .read_strategy
            .read(
                || async {
                    let entry = self.cache.get(&key).await;
                    entry.map(|hit| hit.and_then(CacheEntry::into_customer))
                },
                || async {
                    tracing::info!(customer_id = %id, "Fetching customer from store");
                    self.store.find_by_id(id).await
                },
                Some(|customer: Customer| {
                    self.cache.put(key.clone(), CacheEntry::Customer(customer))
                }),
            )
            .await?;

        if found.is_none() {
            tracing::debug!(customer_id = %id, "Customer not found");
        }
        Ok(found)
    }

    /// Email is not unique, so this path is never cached.
    pub async fn get_customers_by_email(&self, email: &str) -> Result<Vec<Customer>> {
        tracing::info!(email, "Fetching customers by email from store");
        self.store.find_by_email(email).await
    }

    /// Persist a new customer. The Store assigns the id.
    pub async fn create_customer(&self, details: CustomerDetails) -> Result<Customer> {
        tracing::info!(name = %details.name, "Creating new customer");

        let created = self
            .config
            .create_strategy()
            .write(self.cache.as_ref(), || {
                self.store.save(Customer::new(details))
            })
            .await?;

        if let Some(id) = &created.id {
            tracing::info!(customer_id = %id, "Created customer");
        }
        Ok(created)
    }

    /// Overwrite name, email and address of an existing customer.
    ///
    /// Returns `Ok(None)` when `id` is unknown; nothing is saved or cached.
    pub async fn update_customer(
        &self,
        id: &CustomerId,
        changes: CustomerDetails,
    ) -> Result<Option<Customer>> {
        tracing::info!(customer_id = %id, "Attempting to update customer");

        WriteStrategy::WriteThrough
            .write(self.cache.as_ref(), || self.apply_update(id, &changes))
            .await
    }

    async fn apply_update(
        &self,
        id: &CustomerId,
        changes: &CustomerDetails,
    ) -> Result<Option<Customer>> {
        let Some(mut existing) = self.store.find_by_id(id).await? else {
            tracing::warn!(customer_id = %id, "Customer not found for update");
            return Ok(None);
        };
        existing.apply(changes);
        let updated = self.store.save(existing).await?;
        tracing::info!(customer_id = %id, "Successfully updated customer");
        Ok(Some(updated))
    }

    /// Remove a customer. Returns `Ok(false)` when `id` is unknown, in which
    /// case the Store delete is never issued.
    pub async fn delete_customer(&self, id: &CustomerId) -> Result<bool> {
        tracing::info!(customer_id = %id, "Attempting to delete customer");
        let key = CacheKey::customer(id);

        let deleted = WriteStrategy::WriteAround
            .write(self.cache.as_ref(), || self.evict_and_delete(id, &key))
            .await?;

        if deleted {
            // A reader may have refilled the key between the evictions and
            // the delete.
            if let Err(e) = self.cache.evict(&key).await {
                tracing::warn!(error = %e, customer_id = %id, "Post-delete eviction failed");
            }
        }
        Ok(deleted)
    }

    async fn evict_and_delete(&self, id: &CustomerId, key: &CacheKey) -> Result<bool> {
        self.cache.evict(key).await?;

        if !self.store.exists_by_id(id).await? {
            tracing::warn!(customer_id = %id, "Customer not found for deletion");
            return Ok(false);
        }
        self.store.delete_by_id(id).await?;
        tracing::info!(customer_id = %id, "Successfully deleted customer");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CustomerCache, MemoryCache};
    use crate::error::PersistenceError;
    use crate::repository::InMemoryCustomerRepository;
    use async_trait::async_trait;
    use fake::Fake;
    use fake::faker::address::en::StreetName;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use std::sync::Mutex;

    struct Harness {
        store: Arc<InMemoryCustomerRepository>,
        cache: Arc<MemoryCache>,
        service: CachedCustomerService,
    }

    fn harness_with(config: ServiceConfig) -> Harness {
        let store = Arc::new(InMemoryCustomerRepository::new());
        let cache = Arc::new(MemoryCache::new());
        let service = CachedCustomerService::with_config(store.clone(), cache.clone(), config);
        Harness {
            store,
            cache,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(ServiceConfig::default())
    }

    fn alice() -> CustomerDetails {
        CustomerDetails::new("Alice Smith", "alice@example.com", "123 Main St")
    }

    fn random_details() -> CustomerDetails {
        CustomerDetails::new(
            Name().fake::<String>(),
            SafeEmail().fake::<String>(),
            StreetName().fake::<String>(),
        )
    }

    fn id_of(customer: &Customer) -> CustomerId {
        customer.id.clone().expect("persisted customer has an id")
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let h = harness();
        let id = id_of(&h.service.create_customer(alice()).await.unwrap());

        let first = h.service.get_customer_by_id(&id).await.unwrap();
        let reads_after_first = h.store.call_counts().find_by_id;
        let second = h.service.get_customer_by_id(&id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(reads_after_first, 1);
        assert_eq!(h.store.call_counts().find_by_id, 1);
        assert_eq!(h.cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_absent_id_is_not_cached() {
        let h = harness();
        let id = CustomerId::new("missing");

        assert_eq!(h.service.get_customer_by_id(&id).await.unwrap(), None);
        assert_eq!(h.service.get_customer_by_id(&id).await.unwrap(), None);

        assert_eq!(h.store.call_counts().find_by_id, 2);
        assert!(h.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_only_reads_bypass_cache() {
        let h = harness_with(ServiceConfig::new().with_read_strategy(ReadStrategy::StoreOnly));
        let id = id_of(&h.service.create_customer(alice()).await.unwrap());

        h.service.get_customer_by_id(&id).await.unwrap();
        h.service.get_customer_by_id(&id).await.unwrap();

        assert_eq!(h.store.call_counts().find_by_id, 2);
        assert!(h.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_email_lookup_bypasses_cache() {
        let h = harness();
        h.service.create_customer(alice()).await.unwrap();

        h.service.get_customers_by_email("alice@example.com").await.unwrap();
        h.service.get_customers_by_email("alice@example.com").await.unwrap();

        assert_eq!(h.store.call_counts().find_by_email, 2);
        assert_eq!(h.cache.stats().hits + h.cache.stats().misses, 0);
    }

    #[tokio::test]
    async fn test_get_all_bypasses_cache() {
        let h = harness();
        for _ in 0..3 {
            h.service.create_customer(random_details()).await.unwrap();
        }

        assert_eq!(h.service.get_all_customers().await.unwrap().len(), 3);
        assert_eq!(h.service.get_all_customers().await.unwrap().len(), 3);
        assert_eq!(h.store.call_counts().find_all, 2);
        assert!(h.cache.is_empty().await);
    }

    // =========================================================================
    // INVALIDATION
    // =========================================================================

    async fn seed_scope(h: &Harness) -> CustomerId {
        let id = id_of(&h.service.create_customer(random_details()).await.unwrap());
        h.service.get_customer_by_id(&id).await.unwrap();
        h.cache.put(CacheKey::All, CacheEntry::Marker).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_invalidates_all_scope() {
        let h = harness();
        let cached = seed_scope(&h).await;

        h.service.create_customer(alice()).await.unwrap();

        assert!(!h.cache.contains(&CacheKey::All).await);
        let before = h.store.call_counts().find_by_id;
        h.service.get_customer_by_id(&cached).await.unwrap();
        assert_eq!(h.store.call_counts().find_by_id, before + 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_all_scope() {
        let h = harness();
        let cached = seed_scope(&h).await;
        let other = id_of(&h.service.create_customer(alice()).await.unwrap());
        h.cache.put(CacheKey::All, CacheEntry::Marker).await.unwrap();

        h.service.update_customer(&other, random_details()).await.unwrap();

        assert!(!h.cache.contains(&CacheKey::All).await);
        assert!(!h.cache.contains(&CacheKey::customer(&cached)).await);
    }

    #[tokio::test]
    async fn test_delete_invalidates_all_scope() {
        let h = harness();
        let cached = seed_scope(&h).await;

        assert!(!h.service.delete_customer(&CustomerId::new("nope")).await.unwrap());

        assert!(!h.cache.contains(&CacheKey::All).await);
        assert!(!h.cache.contains(&CacheKey::customer(&cached)).await);
    }

    #[tokio::test]
    async fn test_populate_on_create() {
        let h = harness_with(ServiceConfig::new().with_populate_on_create(true));
        let id = id_of(&h.service.create_customer(alice()).await.unwrap());

        assert!(h.cache.contains(&CacheKey::customer(&id)).await);
        h.service.get_customer_by_id(&id).await.unwrap();
        assert_eq!(h.store.call_counts().find_by_id, 0);
    }

    #[tokio::test]
    async fn test_create_without_populate_leaves_cache_empty() {
        let h = harness();
        h.service.create_customer(alice()).await.unwrap();
        assert!(h.cache.is_empty().await);
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    #[tokio::test]
    async fn test_update_freshness_without_store_read() {
        let h = harness();
        let id = id_of(&h.service.create_customer(alice()).await.unwrap());
        let changes = CustomerDetails::new("Alice Jones", "alice2@example.com", "123 Main St");

        let updated = h.service.update_customer(&id, changes.clone()).await.unwrap();
        let reads_after_update = h.store.call_counts().find_by_id;
        let fetched = h.service.get_customer_by_id(&id).await.unwrap().unwrap();

        assert_eq!(updated.as_ref(), Some(&fetched));
        assert_eq!(fetched.details(), changes);
        assert_eq!(fetched.id, Some(id));
        assert_eq!(h.store.call_counts().find_by_id, reads_after_update);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let h = harness();

        let result = h
            .service
            .update_customer(&CustomerId::new("ghost"), alice())
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(h.store.call_counts().save, 0);
        assert_eq!(h.cache.stats().puts, 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let h = harness();

        assert!(!h.service.delete_customer(&CustomerId::new("ghost")).await.unwrap());
        assert_eq!(h.store.call_counts().delete_by_id, 0);
        assert_eq!(h.store.call_counts().exists_by_id, 1);
    }

    #[tokio::test]
    async fn test_delete_evicts_cached_record() {
        let h = harness();
        let id = id_of(&h.service.create_customer(alice()).await.unwrap());
        h.service.get_customer_by_id(&id).await.unwrap();

        assert!(h.service.delete_customer(&id).await.unwrap());

        assert!(!h.cache.contains(&CacheKey::customer(&id)).await);
        assert_eq!(h.service.get_customer_by_id(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_details_are_stored_as_given() {
        let h = harness();
        let odd = CustomerDetails::new("Bob", "bob at example.com", "");

        let created = h.service.create_customer(odd.clone()).await.unwrap();
        assert_eq!(created.details(), odd);

        let id = id_of(&created);
        let blank = CustomerDetails::new("", "x", "");
        let updated = h.service.update_customer(&id, blank.clone()).await.unwrap();
        assert_eq!(updated.map(|c| c.details()), Some(blank));
    }

    #[tokio::test]
    async fn test_update_unknown_id_with_any_details() {
        let h = harness();
        let ghost = CustomerId::new("ghost");

        let result = h
            .service
            .update_customer(&ghost, CustomerDetails::new("", "no-at-sign", ""))
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(h.store.call_counts().save, 0);
        assert!(!h.cache.contains(&CacheKey::customer(&ghost)).await);
    }

    // =========================================================================
    // FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_store_failure_propagates_without_put() {
        let h = harness();
        let id = id_of(&h.service.create_customer(alice()).await.unwrap());
        h.store.set_available(false);

        let err = h.service.update_customer(&id, random_details()).await.unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(h.cache.is_empty().await);
        assert_eq!(h.cache.stats().puts, 0);

        let err = h.service.get_customer_by_id(&id).await.unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(h.service.create_customer(alice()).await.is_err());
        assert!(h.service.delete_customer(&id).await.is_err());
    }

    /// Cache whose `evict_all` always fails.
    struct BrokenCache;

    #[async_trait]
    impl CustomerCache for BrokenCache {
        async fn get(&self, _key: &CacheKey) -> Result<Option<CacheEntry>> {
            Err(PersistenceError::Cache("unreachable".into()))
        }
        async fn put(&self, _key: CacheKey, _entry: CacheEntry) -> Result<()> {
            Err(PersistenceError::Cache("unreachable".into()))
        }
        async fn evict(&self, _key: &CacheKey) -> Result<()> {
            Err(PersistenceError::Cache("unreachable".into()))
        }
        async fn evict_all(&self) -> Result<()> {
            Err(PersistenceError::Cache("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn test_failed_invalidation_aborts_write() {
        let store = Arc::new(InMemoryCustomerRepository::new());
        let service = CachedCustomerService::new(store.clone(), Arc::new(BrokenCache));

        let err = service.create_customer(alice()).await.unwrap_err();

        assert!(matches!(err, PersistenceError::Cache(_)));
        assert_eq!(store.call_counts().save, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_broken_cache_reads_degrade_to_store() {
        let store = Arc::new(InMemoryCustomerRepository::new());
        let saved = store.save(Customer::new(alice())).await.unwrap();
        let service = CachedCustomerService::new(store.clone(), Arc::new(BrokenCache));

        let found = service.get_customer_by_id(&id_of(&saved)).await.unwrap();

        assert_eq!(found, Some(saved));
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    type Log = Arc<Mutex<Vec<String>>>;

    struct RecordingCache {
        inner: MemoryCache,
        log: Log,
    }

    #[async_trait]
    impl CustomerCache for RecordingCache {
        async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
            self.log.lock().unwrap().push(format!("cache.get {key}"));
            self.inner.get(key).await
        }
        async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<()> {
            self.log.lock().unwrap().push(format!("cache.put {key}"));
            self.inner.put(key, entry).await
        }
        async fn evict(&self, key: &CacheKey) -> Result<()> {
            self.log.lock().unwrap().push(format!("cache.evict {key}"));
            self.inner.evict(key).await
        }
        async fn evict_all(&self) -> Result<()> {
            self.log.lock().unwrap().push("cache.evict_all".to_string());
            self.inner.evict_all().await
        }
    }

    struct RecordingStore {
        inner: InMemoryCustomerRepository,
        log: Log,
    }

    impl RecordingStore {
        fn record(&self, op: &str) {
            self.log.lock().unwrap().push(format!("store.{op}"));
        }
    }

    #[async_trait]
    impl CustomerRepository for RecordingStore {
        async fn find_all(&self) -> Result<Vec<Customer>> {
            self.record("find_all");
            self.inner.find_all().await
        }
        async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>> {
            self.record("find_by_id");
            self.inner.find_by_id(id).await
        }
        async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>> {
            self.record("find_by_email");
            self.inner.find_by_email(email).await
        }
        async fn exists_by_id(&self, id: &CustomerId) -> Result<bool> {
            self.record("exists_by_id");
            self.inner.exists_by_id(id).await
        }
        async fn save(&self, customer: Customer) -> Result<Customer> {
            self.record("save");
            self.inner.save(customer).await
        }
        async fn delete_by_id(&self, id: &CustomerId) -> Result<()> {
            self.record("delete_by_id");
            self.inner.delete_by_id(id).await
        }
    }

    fn recording_service() -> (CachedCustomerService, Log) {
        let log = Log::default();
        let store = RecordingStore {
            inner: InMemoryCustomerRepository::new(),
            log: log.clone(),
        };
        let cache = RecordingCache {
            inner: MemoryCache::new(),
            log: log.clone(),
        };
        (
            CachedCustomerService::new(Arc::new(store), Arc::new(cache)),
            log,
        )
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[tokio::test]
    async fn test_invalidation_precedes_every_store_write() {
        let (service, log) = recording_service();

        let id = id_of(&service.create_customer(alice()).await.unwrap());
        assert_eq!(drain(&log), ["cache.evict_all", "store.save"]);

        service.update_customer(&id, random_details()).await.unwrap();
        assert_eq!(
            drain(&log),
            [
                "cache.evict_all".to_string(),
                "store.find_by_id".to_string(),
                "store.save".to_string(),
                format!("cache.put id:{id}"),
            ]
        );

        service.delete_customer(&id).await.unwrap();
        assert_eq!(
            drain(&log),
            [
                "cache.evict_all".to_string(),
                format!("cache.evict id:{id}"),
                "store.exists_by_id".to_string(),
                "store.delete_by_id".to_string(),
                format!("cache.evict id:{id}"),
            ]
        );
    }

    #[tokio::test]
    async fn test_point_read_order() {
        let (service, log) = recording_service();
        let id = id_of(&service.create_customer(alice()).await.unwrap());
        drain(&log);

        service.get_customer_by_id(&id).await.unwrap();
        service.get_customer_by_id(&id).await.unwrap();

        assert_eq!(
            drain(&log),
            [
                format!("cache.get id:{id}"),
                "store.find_by_id".to_string(),
                format!("cache.put id:{id}"),
                format!("cache.get id:{id}"),
            ]
        );
    }

    // =========================================================================
    // CONCURRENCY
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_to_distinct_ids_stay_consistent() {
        let h = harness();
        let mut ids = Vec::new();
        for _ in 0..8 {
            ids.push(id_of(&h.service.create_customer(random_details()).await.unwrap()));
        }

        let tasks: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let service = h.service.clone();
                tokio::spawn(async move {
                    for round in 0..5 {
                        let changes = CustomerDetails::new(
                            format!("{id}-{round}"),
                            format!("{round}@example.com"),
                            "1 Way",
                        );
                        service.update_customer(&id, changes).await.unwrap();
                        service.get_customer_by_id(&id).await.unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        for id in &ids {
            let stored = h.store.find_by_id(id).await.unwrap();
            let served = h.service.get_customer_by_id(id).await.unwrap();
            assert_eq!(served, stored);
            assert_eq!(served.unwrap().name, format!("{id}-4"));
        }
    }

    // =========================================================================
    // END TO END
    // =========================================================================

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let h = harness();

        let created = h.service.create_customer(alice()).await.unwrap();
        let alice_id = id_of(&created);

        let by_email = h
            .service
            .get_customers_by_email("alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].name, "Alice Smith");

        let changes = CustomerDetails::new("Alice Jones", "alice2@example.com", "123 Main St");
        h.service.update_customer(&alice_id, changes).await.unwrap();
        let fetched = h.service.get_customer_by_id(&alice_id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Alice Jones");
        assert_eq!(fetched.email, "alice2@example.com");

        assert!(h.service.delete_customer(&alice_id).await.unwrap());
        assert_eq!(h.service.get_customer_by_id(&alice_id).await.unwrap(), None);
    }
}
