use crate::cache::{CacheEntry, UrlCache};
use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::Op;
use moka::policy::EvictionPolicy;
use snip_core::{ShortKey, StorageError};
use std::future::Future;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// An in-memory LRU cache backed by Moka.
///
/// Entries past `max_capacity` are evicted least recently used first. Both
/// reads and writes count as a use. Eviction is applied by Moka's
/// maintenance tasks, so the entry count may briefly exceed the capacity
/// until [`MokaUrlCache::run_pending_tasks`] (or normal traffic) catches up.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<ShortKey, CacheEntry>,
}

impl MokaUrlCache {
    pub const DEFAULT_CAPACITY: u64 = 1024;

    /// Creates a cache holding up to [`Self::DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        CacheConfig::builder().max_capacity(max_capacity).build().into()
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Applies pending evictions and recency updates.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get(&self, key: &ShortKey) -> Option<CacheEntry> {
        let entry = self.cache.get(key).await;
        match &entry {
            Some(_) => debug!(key = %key, "cache hit"),
            None => trace!(key = %key, "cache miss"),
        }
        entry
    }

    async fn put(&self, key: &ShortKey, entry: CacheEntry) {
        trace!(key = %key, absent = entry.is_absent(), "caching entry");
        // Goes through the compute path so it is serialized with `mark_absent`.
        self.cache
            .entry(key.clone())
            .and_compute_with(move |_| async move { Op::Put(entry) })
            .await;
    }

    async fn mark_absent(&self, key: &ShortKey) -> CacheEntry {
        let result = self
            .cache
            .entry(key.clone())
            .and_compute_with(|current| async move {
                match current {
                    Some(_) => Op::Nop,
                    None => Op::Put(CacheEntry::Absent),
                }
            })
            .await;

        result
            .into_entry()
            .map(|entry| entry.into_value())
            .unwrap_or(CacheEntry::Absent)
    }

    async fn get_or_fetch<F, Fut>(&self, key: &ShortKey, fetch: F) -> Result<CacheEntry, StorageError>
    where
        F: FnOnce(&ShortKey) -> Fut + Send,
        Fut: Future<Output = Result<CacheEntry, StorageError>> + Send,
    {
        // Concurrent misses on the same key share one fetch. Only targets are
        // stored by the shared fetch; an absence is written afterwards through
        // `mark_absent` so it cannot replace a target put in the meantime.
        let fetched = self
            .cache
            .try_get_with(key.clone(), async {
                trace!(key = %key, "cache miss, fetching");
                match fetch(key).await {
                    Ok(CacheEntry::Target(target)) => Ok(CacheEntry::Target(target)),
                    Ok(CacheEntry::Absent) => Err(Miss::Absent),
                    Err(e) => Err(Miss::Failed(e)),
                }
            })
            .await;

        match fetched {
            Ok(entry) => Ok(entry),
            Err(miss) => match miss.as_ref() {
                Miss::Absent => Ok(self.mark_absent(key).await),
                Miss::Failed(e) => Err(e.clone()),
            },
        }
    }
}

/// Outcome of a shared fetch that must not be stored as is.
#[derive(Debug)]
enum Miss {
    Absent,
    Failed(StorageError),
}

/// Configuration for creating a [`MokaUrlCache`].
#[derive(Debug, TypedBuilder)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = MokaUrlCache::DEFAULT_CAPACITY)]
    max_capacity: u64,
    /// Capacity to preallocate.
    #[builder(default, setter(strip_option))]
    initial_capacity: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<CacheConfig> for MokaUrlCache {
    fn from(config: CacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity)
            .eviction_policy(EvictionPolicy::lru());

        if let Some(initial) = config.initial_capacity {
            builder = builder.initial_capacity(initial);
        }

        MokaUrlCache {
            cache: builder.build(),
        }
    }
}
