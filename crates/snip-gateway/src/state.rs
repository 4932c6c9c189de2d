use std::sync::Arc;
use std::time::Duration;

use snip_cache::MokaUrlCache;
use snip_core::{KeyScheme, ReadRepository, Repository, SequenceRepository};
use snip_generator::{RandomKeyGenerator, SequentialKeyGenerator};
use snip_redirector::{CachedRepository, Redirector, RedirectorService, RedirectorSettings};
use snip_shortener::{Shortener, ShortenerService, ShortenerSettings};
use snip_storage::Deadline;
use typed_builder::TypedBuilder;

/// Settings shared by every backend and key scheme.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GatewaySettings {
    /// Public base of short links, e.g. `https://sn.ip`.
    #[builder(setter(into))]
    pub base_url: String,
    #[builder(default = Duration::from_secs(5))]
    pub store_timeout: Duration,
    #[builder(default = MokaUrlCache::DEFAULT_CAPACITY)]
    pub cache_capacity: u64,
    #[builder(default)]
    pub shortener: ShortenerSettings,
}

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    redirector: Arc<dyn Redirector>,
    health: Arc<dyn ReadRepository>,
    base_url: Arc<str>,
}

impl AppState {
    pub fn new(
        shortener: Arc<dyn Shortener>,
        redirector: Arc<dyn Redirector>,
        health: Arc<dyn ReadRepository>,
        public_base_url: impl Into<String>,
    ) -> Self {
        let base_url: String = public_base_url.into();
        Self {
            shortener,
            redirector,
            health,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    /// Wires random letter keys of `length` over a keyed store.
    pub fn with_random_keys<R: Repository>(
        store: R,
        length: usize,
        settings: &GatewaySettings,
    ) -> Self {
        let store = Arc::new(Deadline::new(store, settings.store_timeout));
        let cache = MokaUrlCache::with_capacity(settings.cache_capacity);

        let shortener = ShortenerService::new(
            RandomKeyGenerator::with_length(Arc::clone(&store), length),
            cache.clone(),
            settings.shortener.clone(),
        );
        let redirector = RedirectorService::new(
            CachedRepository::new(Arc::clone(&store), cache),
            RedirectorSettings::builder()
                .base_url(settings.base_url.clone())
                .scheme(KeyScheme::Random { length })
                .build(),
        );

        Self::new(
            Arc::new(shortener),
            Arc::new(redirector),
            store,
            settings.base_url.clone(),
        )
    }

    /// Wires base-62 keys over a store that assigns sequential ids.
    pub fn with_sequential_keys<S: SequenceRepository>(
        store: S,
        settings: &GatewaySettings,
    ) -> Self {
        let store = Arc::new(Deadline::new(store, settings.store_timeout));
        let cache = MokaUrlCache::with_capacity(settings.cache_capacity);

        let shortener = ShortenerService::new(
            SequentialKeyGenerator::new(Arc::clone(&store)),
            cache.clone(),
            settings.shortener.clone(),
        );
        let redirector = RedirectorService::new(
            CachedRepository::new(Arc::clone(&store), cache),
            RedirectorSettings::builder()
                .base_url(settings.base_url.clone())
                .scheme(KeyScheme::Sequential)
                .build(),
        );

        Self::new(
            Arc::new(shortener),
            Arc::new(redirector),
            store,
            settings.base_url.clone(),
        )
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    pub fn redirector(&self) -> &dyn Redirector {
        self.redirector.as_ref()
    }

    pub fn health(&self) -> &dyn ReadRepository {
        self.health.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
