use crate::error::StorageError;
use crate::shortkey::ShortKey;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A persisted mapping from a short key to its target URL.
///
/// Records are created once and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub key: ShortKey,
    pub target: String,
}

impl UrlRecord {
    pub fn new(key: ShortKey, target: impl Into<String>) -> Self {
        Self {
            key,
            target: target.into(),
        }
    }
}

/// A read-only view of a key-value store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the target URL for a given key.
    /// Returns `None` if the store confirms the key does not exist.
    async fn get(&self, key: &ShortKey) -> Result<Option<String>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A store keyed by caller-chosen keys (random scheme).
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record if its key is free.
    /// Returns `Err(Conflict)` if the key already exists; the stored target is left unchanged.
    async fn insert(&self, record: &UrlRecord) -> Result<()>;
}

/// A store that assigns sequential identifiers (sequential scheme).
///
/// [`ReadRepository::get`] on such a store looks keys up by their decoded
/// identifier.
#[async_trait]
pub trait SequenceRepository: ReadRepository {
    /// Persists `target` and returns its identifier in one atomic step.
    ///
    /// Idempotent: a target that is already stored returns its existing
    /// identifier.
    async fn insert_returning_id(&self, target: &str) -> Result<i64>;
}

#[async_trait]
impl<R: ReadRepository + ?Sized> ReadRepository for Arc<R> {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    async fn insert(&self, record: &UrlRecord) -> Result<()> {
        (**self).insert(record).await
    }
}

#[async_trait]
impl<R: SequenceRepository + ?Sized> SequenceRepository for Arc<R> {
    async fn insert_returning_id(&self, target: &str) -> Result<i64> {
        (**self).insert_returning_id(target).await
    }
}
