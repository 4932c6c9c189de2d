//! Store wrappers that let tests observe and disturb store traffic.

use async_trait::async_trait;
use snip_core::repository::Result;
use snip_core::{ReadRepository, Repository, SequenceRepository, ShortKey, StorageError, UrlRecord};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Counts every call that reaches the inner store.
#[derive(Debug, Default)]
pub struct CountingRepository<R> {
    inner: R,
    gets: AtomicUsize,
    inserts: AtomicUsize,
}

impl<R> CountingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of `get` calls so far.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `insert` and `insert_returning_id` calls so far.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: ReadRepository> ReadRepository for CountingRepository<R> {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

#[async_trait]
impl<R: Repository> Repository for CountingRepository<R> {
    async fn insert(&self, record: &UrlRecord) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(record).await
    }
}

#[async_trait]
impl<R: SequenceRepository> SequenceRepository for CountingRepository<R> {
    async fn insert_returning_id(&self, target: &str) -> Result<i64> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_returning_id(target).await
    }
}

/// Fails every call with [`StorageError::Unavailable`] while switched on.
#[derive(Debug, Default)]
pub struct FlakyRepository<R> {
    inner: R,
    failing: AtomicBool,
}

impl<R> FlakyRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    /// Starts in the failing state.
    pub fn failing(inner: R) -> Self {
        let repo = Self::new(inner);
        repo.set_failing(true);
        repo
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: ReadRepository> ReadRepository for FlakyRepository<R> {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn ping(&self) -> Result<()> {
        self.check()?;
        self.inner.ping().await
    }
}

#[async_trait]
impl<R: Repository> Repository for FlakyRepository<R> {
    async fn insert(&self, record: &UrlRecord) -> Result<()> {
        self.check()?;
        self.inner.insert(record).await
    }
}

#[async_trait]
impl<R: SequenceRepository> SequenceRepository for FlakyRepository<R> {
    async fn insert_returning_id(&self, target: &str) -> Result<i64> {
        self.check()?;
        self.inner.insert_returning_id(target).await
    }
}

/// Reports every insert as a duplicate key, as if the key space were full.
#[derive(Debug, Default)]
pub struct AlwaysConflicting;

#[async_trait]
impl ReadRepository for AlwaysConflicting {
    async fn get(&self, _key: &ShortKey) -> Result<Option<String>> {
        Ok(None)
    }
}

#[async_trait]
impl Repository for AlwaysConflicting {
    async fn insert(&self, record: &UrlRecord) -> Result<()> {
        Err(StorageError::Conflict(record.key.to_string()))
    }
}
