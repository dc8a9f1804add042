//! Read strategy implementations using enum dispatch.

use std::fmt::Debug;
use std::future::Future;

use crate::error::Result;

/// Read strategy enum - determines cache/Store access pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Check cache first, fall back to the Store on miss
    #[default]
    CacheFirst,
    /// Only read from the Store, skip cache
    StoreOnly,
}

impl ReadStrategy {
    /// Execute a read operation according to the strategy.
    ///
    /// - `cache_fn`: Async function to read from cache
    /// - `store_fn`: Async function to read from the Store
    /// - `populate_fn`: Optional async function to populate cache after a Store hit
    ///
    /// Cache failures degrade to a Store read. Store failures propagate.
    /// An absent Store result is returned as-is and never cached.
    pub async fn read<T, CacheFut, StoreFut, PopulateFut>(
        &self,
        cache_fn: impl FnOnce() -> CacheFut,
        store_fn: impl FnOnce() -> StoreFut,
        populate_fn: Option<impl FnOnce(T) -> PopulateFut>,
    ) -> Result<Option<T>>
    where
        T: Clone + Debug,
        CacheFut: Future<Output = Result<Option<T>>>,
        StoreFut: Future<Output = Result<Option<T>>>,
        PopulateFut: Future<Output = Result<()>>,
    {
        match self {
            Self::CacheFirst => {
                match cache_fn().await {
                    Ok(Some(value)) => {
                        tracing::debug!("Cache hit");
                        return Ok(Some(value));
                    }
                    Ok(None) => {
                        tracing::debug!("Cache miss, falling back to store");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Cache error, falling back to store");
                    }
                }

                let result = store_fn().await?;

                if let (Some(value), Some(populate)) = (&result, populate_fn) {
                    if let Err(e) = populate(value.clone()).await {
                        tracing::warn!(error = %e, "Failed to populate cache");
                    }
                }

                Ok(result)
            }

            Self::StoreOnly => store_fn().await,
        }
    }
}

impl std::str::FromStr for ReadStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cache_first" | "cache-first" => Ok(Self::CacheFirst),
            "store_only" | "store-only" => Ok(Self::StoreOnly),
            other => Err(format!("unknown read strategy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use std::future::Ready;
    use std::sync::{Arc, Mutex};

    type Populate = fn(String) -> Ready<Result<()>>;

    const NO_POPULATE: Option<Populate> = None;

    fn cached_alice() -> Result<Option<String>> {
        Ok(Some("alice (cached)".to_string()))
    }

    fn stored_alice() -> Result<Option<String>> {
        Ok(Some("alice (stored)".to_string()))
    }

    #[tokio::test]
    async fn test_cache_first_hit() {
        let found = ReadStrategy::CacheFirst
            .read(|| async { cached_alice() }, || async { stored_alice() }, NO_POPULATE)
            .await
            .unwrap();

        assert_eq!(found.as_deref(), Some("alice (cached)"));
    }

    #[tokio::test]
    async fn test_cache_first_miss_populates() {
        let put = Arc::new(Mutex::new(Vec::new()));
        let sink = put.clone();

        let found = ReadStrategy::CacheFirst
            .read(
                || async { Ok(None) },
                || async { stored_alice() },
                Some(move |record: String| {
                    sink.lock().unwrap().push(record);
                    async { Ok(()) }
                }),
            )
            .await
            .unwrap();

        assert_eq!(found.as_deref(), Some("alice (stored)"));
        assert_eq!(*put.lock().unwrap(), vec!["alice (stored)".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_first_absent_is_not_populated() {
        let put = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = put.clone();

        let found = ReadStrategy::CacheFirst
            .read(
                || async { Ok(None) },
                || async { Ok(None) },
                Some(move |record: String| {
                    sink.lock().unwrap().push(record);
                    async { Ok(()) }
                }),
            )
            .await
            .unwrap();

        assert_eq!(found, None);
        assert!(put.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_error_falls_back_to_store() {
        let found = ReadStrategy::CacheFirst
            .read(
                || async { Err(PersistenceError::Cache("connection refused".into())) },
                || async { stored_alice() },
                NO_POPULATE,
            )
            .await
            .unwrap();

        assert_eq!(found.as_deref(), Some("alice (stored)"));
    }

    #[tokio::test]
    async fn test_failed_populate_still_returns_record() {
        let found = ReadStrategy::CacheFirst
            .read(
                || async { Ok(None) },
                || async { stored_alice() },
                Some(|_: String| async { Err(PersistenceError::Cache("full".into())) }),
            )
            .await
            .unwrap();

        assert_eq!(found.as_deref(), Some("alice (stored)"));
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let err = ReadStrategy::CacheFirst
            .read(
                || async { Ok(None) },
                || async { Err::<Option<String>, _>(PersistenceError::Store("offline".into())) },
                NO_POPULATE,
            )
            .await
            .unwrap_err();

        assert!(err.is_store_unavailable());
    }

    #[tokio::test]
    async fn test_store_only_ignores_cached_record() {
        let found = ReadStrategy::StoreOnly
            .read(|| async { cached_alice() }, || async { stored_alice() }, NO_POPULATE)
            .await
            .unwrap();

        assert_eq!(found.as_deref(), Some("alice (stored)"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("cache-first".parse::<ReadStrategy>(), Ok(ReadStrategy::CacheFirst));
        assert_eq!("STORE_ONLY".parse::<ReadStrategy>(), Ok(ReadStrategy::StoreOnly));
        assert!("write_back".parse::<ReadStrategy>().is_err());
    }
}
