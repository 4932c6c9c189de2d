use async_trait::async_trait;
use snip_core::repository::Result;
use snip_core::{ReadRepository, Repository, SequenceRepository, ShortKey, StorageError, UrlRecord};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A repository decorator that bounds every call with a timeout.
///
/// A slow or unreachable backend then fails individual requests with
/// [`StorageError::Timeout`] instead of tying up every worker. The inner
/// future is dropped on expiry, which cancels the in-flight query.
#[derive(Debug, Clone)]
pub struct Deadline<R> {
    inner: R,
    timeout: Duration,
}

impl<R> Deadline<R> {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn with_default_timeout(inner: R) -> Self {
        Self::new(inner, Self::DEFAULT_TIMEOUT)
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?self.timeout, "store call timed out");
                Err(StorageError::Timeout(format!(
                    "{} exceeded {:?}",
                    operation, self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl<R: ReadRepository> ReadRepository for Deadline<R> {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn ping(&self) -> Result<()> {
        self.bounded("ping", self.inner.ping()).await
    }
}

#[async_trait]
impl<R: Repository> Repository for Deadline<R> {
    async fn insert(&self, record: &UrlRecord) -> Result<()> {
        self.bounded("insert", self.inner.insert(record)).await
    }
}

#[async_trait]
impl<R: SequenceRepository> SequenceRepository for Deadline<R> {
    async fn insert_returning_id(&self, target: &str) -> Result<i64> {
        self.bounded("insert_returning_id", self.inner.insert_returning_id(target))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryRepository;

    /// A store that never answers.
    struct Stalled;

    #[async_trait]
    impl ReadRepository for Stalled {
        async fn get(&self, _key: &ShortKey) -> Result<Option<String>> {
            std::future::pending().await
        }

        async fn ping(&self) -> Result<()> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl Repository for Stalled {
        async fn insert(&self, _record: &UrlRecord) -> Result<()> {
            std::future::pending().await
        }
    }

    fn key(s: &str) -> ShortKey {
        ShortKey::new_unchecked(s)
    }

    #[tokio::test(start_paused = true)]
    async fn get_times_out() {
        let repo = Deadline::new(Stalled, Duration::from_secs(5));

        let err = repo.get(&key("abcDEF")).await.unwrap_err();

        assert!(matches!(err, StorageError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn insert_and_ping_time_out() {
        let repo = Deadline::with_default_timeout(Stalled);

        let err = repo
            .insert(&UrlRecord::new(key("abcDEF"), "https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Timeout(_)));

        let err = repo.ping().await.unwrap_err();
        assert!(matches!(err, StorageError::Timeout(_)));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let repo = Deadline::with_default_timeout(InMemoryRepository::new());
        let record = UrlRecord::new(key("abcDEF"), "https://example.com");

        repo.insert(&record).await.unwrap();
        let err = repo.insert(&record).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(
            repo.get(&key("abcDEF")).await.unwrap().as_deref(),
            Some("https://example.com")
        );
        assert_eq!(repo.timeout(), Deadline::<()>::DEFAULT_TIMEOUT);
    }
}
