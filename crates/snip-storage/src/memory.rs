use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snip_core::repository::Result;
use snip_core::{ReadRepository, Repository, SequenceRepository, ShortKey, StorageError, UrlRecord};
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory implementation of the [`Repository`] trait using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    storage: DashMap<ShortKey, String>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        Ok(self.storage.get(key).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, record: &UrlRecord) -> Result<()> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.storage.entry(record.key.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(record.key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record.target.clone());
                Ok(())
            }
        }
    }
}

/// In-memory implementation of [`SequenceRepository`].
///
/// Identifiers start at 1, like a `BIGSERIAL` column.
#[derive(Debug)]
pub struct InMemorySequenceRepository {
    next_id: AtomicI64,
    ids: DashMap<String, i64>,
    targets: DashMap<i64, String>,
}

impl InMemorySequenceRepository {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a repository whose first assigned identifier is `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        Self {
            next_id: AtomicI64::new(first_id),
            ids: DashMap::new(),
            targets: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for InMemorySequenceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemorySequenceRepository {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        let Some(id) = key.to_id().ok().and_then(|id| i64::try_from(id).ok()) else {
            return Ok(None);
        };

        Ok(self.targets.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl SequenceRepository for InMemorySequenceRepository {
    async fn insert_returning_id(&self, target: &str) -> Result<i64> {
        // `targets` is only ever locked after `ids`, never the other way round.
        let id = *self
            .ids
            .entry(target.to_owned())
            .or_insert_with(|| {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                self.targets.insert(id, target.to_owned());
                id
            })
            .value();

        Ok(id)
    }
}
