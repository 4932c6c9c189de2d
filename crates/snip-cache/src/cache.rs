use async_trait::async_trait;
use snip_core::{ShortKey, StorageError};
use std::future::Future;

/// A cached resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The key resolves to this target URL.
    Target(String),
    /// The store confirmed that the key does not exist.
    Absent,
}

impl CacheEntry {
    /// Returns the target URL, or `None` for the absent marker.
    pub fn into_target(self) -> Option<String> {
        match self {
            CacheEntry::Target(target) => Some(target),
            CacheEntry::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CacheEntry::Absent)
    }
}

impl From<Option<String>> for CacheEntry {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(target) => CacheEntry::Target(target),
            None => CacheEntry::Absent,
        }
    }
}

/// A non-authoritative cache of resolution results.
///
/// Implementations must be safe to share between tasks without external
/// locking. Losing any entry must never change what a key resolves to.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the cached entry for `key`.
    ///
    /// Returns `None` on a cache miss, which is distinct from a cached
    /// [`CacheEntry::Absent`].
    async fn get(&self, key: &ShortKey) -> Option<CacheEntry>;

    /// Store an entry, marking it most recently used.
    async fn put(&self, key: &ShortKey, entry: CacheEntry);

    /// Record that the store has no target for `key`, unless an entry is
    /// already cached. Returns the entry cached afterwards.
    ///
    /// An absence observed by a lookup must never replace a target written
    /// after that lookup started. Implementations should make the check and
    /// the write a single step.
    async fn mark_absent(&self, key: &ShortKey) -> CacheEntry {
        if let Some(entry) = self.get(key).await {
            return entry;
        }
        self.put(key, CacheEntry::Absent).await;
        CacheEntry::Absent
    }

    /// Get the cached entry for `key`, fetching and caching it on a miss.
    ///
    /// Fetch errors are returned to the caller and never cached.
    async fn get_or_fetch<F, Fut>(&self, key: &ShortKey, fetch: F) -> Result<CacheEntry, StorageError>
    where
        F: FnOnce(&ShortKey) -> Fut + Send,
        Fut: Future<Output = Result<CacheEntry, StorageError>> + Send,
    {
        if let Some(entry) = self.get(key).await {
            return Ok(entry);
        }

        match fetch(key).await? {
            CacheEntry::Absent => Ok(self.mark_absent(key).await),
            entry => {
                self.put(key, entry.clone()).await;
                Ok(entry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct TestCache {
        items: Mutex<HashMap<ShortKey, CacheEntry>>,
    }

    #[async_trait]
    impl UrlCache for TestCache {
        async fn get(&self, key: &ShortKey) -> Option<CacheEntry> {
            self.items.lock().await.get(key).cloned()
        }

        async fn put(&self, key: &ShortKey, entry: CacheEntry) {
            self.items.lock().await.insert(key.clone(), entry);
        }
    }

    fn key(s: &str) -> ShortKey {
        ShortKey::new_unchecked(s)
    }

    #[tokio::test]
    async fn get_or_fetch_returns_cached_value_without_fetch() {
        let cache = TestCache::default();
        let k = key("abcDEF");
        cache
            .put(&k, CacheEntry::Target("https://cached.example".to_string()))
            .await;

        let fetch_calls = Arc::new(AtomicUsize::new(0));
        let result = cache
            .get_or_fetch(&k, {
                let fetch_calls = Arc::clone(&fetch_calls);
                move |_| async move {
                    fetch_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(CacheEntry::Target("https://fetched.example".to_string()))
                }
            })
            .await
            .unwrap();

        assert_eq!(
            result,
            CacheEntry::Target("https://cached.example".to_string())
        );
        assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_or_fetch_backfills_absent_marker() {
        let cache = TestCache::default();
        let k = key("missed");

        let result = cache
            .get_or_fetch(&k, |_| async { Ok(CacheEntry::Absent) })
            .await
            .unwrap();

        assert!(result.is_absent());
        assert_eq!(cache.get(&k).await, Some(CacheEntry::Absent));
    }

    #[tokio::test]
    async fn get_or_fetch_does_not_cache_errors() {
        let cache = TestCache::default();
        let k = key("broken");

        let err = cache
            .get_or_fetch(&k, |_| async {
                Err(StorageError::Unavailable("down".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Unavailable(_)));
        assert_eq!(cache.get(&k).await, None);
    }

    #[tokio::test]
    async fn mark_absent_keeps_existing_target() {
        let cache = TestCache::default();
        let k = key("abcDEF");
        cache
            .put(&k, CacheEntry::Target("https://late.example".to_string()))
            .await;

        let entry = cache.mark_absent(&k).await;

        assert_eq!(entry, CacheEntry::Target("https://late.example".to_string()));
        assert_eq!(cache.get(&k).await, Some(entry));
    }

    #[test]
    fn entry_from_option() {
        assert_eq!(
            CacheEntry::from(Some("https://a.com".to_string())),
            CacheEntry::Target("https://a.com".to_string())
        );
        assert_eq!(CacheEntry::from(None), CacheEntry::Absent);
        assert_eq!(CacheEntry::Absent.into_target(), None);
    }
}
