use async_trait::async_trait;
use snip_cache::{CacheEntry, UrlCache};
use snip_core::repository::Result;
use snip_core::{ReadRepository, ShortKey};
use tracing::{trace, warn};

/// A read-only repository decorator that adds caching.
///
/// Composes any [`ReadRepository`] with any [`UrlCache`]. Reads check the
/// cache first and fall back to the inner repository. Both found targets and
/// confirmed absences are cached; store errors are not.
#[derive(Debug, Clone)]
pub struct CachedRepository<R, C> {
    inner: R,
    cache: C,
}

impl<R: ReadRepository, C: UrlCache> CachedRepository<R, C> {
    pub fn new(inner: R, cache: C) -> Self {
        Self { inner, cache }
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }
}

#[async_trait]
impl<R: ReadRepository, C: UrlCache> ReadRepository for CachedRepository<R, C> {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        trace!(key = %key, "fetching target with cache");

        let entry = self
            .cache
            .get_or_fetch(key, move |k| {
                let key = k.clone();
                async move {
                    trace!(key = %key, "cache miss, fetching from inner repository");
                    self.inner.get(&key).await.map(CacheEntry::from)
                }
            })
            .await
            .inspect_err(|e| warn!(key = %key, error = %e, "store lookup failed"))?;

        Ok(entry.into_target())
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}
