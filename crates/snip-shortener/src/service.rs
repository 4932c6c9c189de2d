use crate::error::{Result, ShortenerError};
use crate::shortener::Shortener;
use async_trait::async_trait;
use snip_cache::{CacheEntry, UrlCache};
use snip_core::ShortKey;
use snip_generator::KeyGenerator;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;
use url::Url;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// How many keys to try before giving up on collisions.
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Longest accepted target URL, in bytes.
    #[builder(default = 2048)]
    pub max_url_length: usize,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the [`Shortener`] trait.
///
/// The generator persists the mapping; on success the service also writes
/// it to the cache so the first redirect does not miss. Nothing is cached
/// when shortening fails.
pub struct ShortenerService<G, C> {
    generator: G,
    cache: C,
    settings: ShortenerSettings,
}

impl<G: KeyGenerator, C: UrlCache> ShortenerService<G, C> {
    pub fn new(generator: G, cache: C, settings: ShortenerSettings) -> Self {
        Self {
            generator,
            cache,
            settings,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Accepts absolute URLs with both a scheme and a host.
    fn validate_url(&self, raw_url: &str) -> Result<()> {
        if raw_url.is_empty() {
            return Err(ShortenerError::InvalidUrl("URL cannot be empty".to_string()));
        }

        if raw_url.len() > self.settings.max_url_length {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL is longer than {} bytes",
                self.settings.max_url_length
            )));
        }

        let url = Url::parse(raw_url).map_err(|e| ShortenerError::InvalidUrl(e.to_string()))?;
        if !url.has_host() {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {}",
                raw_url
            )));
        }

        Ok(())
    }

    async fn mint(&self, raw_url: &str) -> Result<ShortKey> {
        let attempts = self.settings.max_attempts;

        for attempt in 1..=attempts {
            match self.generator.mint(raw_url).await {
                Ok(key) => return Ok(key),
                Err(e) if e.is_conflict() => {
                    debug!(attempt, error = %e, "key collision, retrying");
                }
                Err(e) => {
                    warn!(error = %e, "failed to store short key");
                    return Err(e.into());
                }
            }
        }

        warn!(attempts, scheme = %self.generator.scheme(), "key space exhausted");
        Err(ShortenerError::KeysExhausted { attempts })
    }
}

#[async_trait]
impl<G: KeyGenerator, C: UrlCache> Shortener for ShortenerService<G, C> {
    async fn shorten(&self, raw_url: &str) -> Result<ShortKey> {
        if let Err(e) = self.validate_url(raw_url) {
            debug!(error = %e, "rejected url");
            return Err(e);
        }

        let key = self.mint(raw_url).await?;
        self.cache
            .put(&key, CacheEntry::Target(raw_url.to_string()))
            .await;

        info!(key = %key, "shortened url");
        Ok(key)
    }
}
