use crate::redirector::Redirector;
use crate::{RedirectorError, Result};
use async_trait::async_trait;
use snip_core::{KeyScheme, ReadRepository};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RedirectorSettings {
    /// Public base of short links, e.g. `https://sn.ip`.
    #[builder(setter(into))]
    pub base_url: String,
    /// Shape that every issued key has.
    #[builder(default)]
    pub scheme: KeyScheme,
}

/// Service for resolving keys to target URLs.
///
/// Malformed keys are answered as not found before the repository is
/// consulted. Wrap the repository in a [`crate::CachedRepository`] to serve
/// repeated lookups from memory.
#[derive(Debug, Clone)]
pub struct RedirectorService<R> {
    repository: R,
    settings: RedirectorSettings,
}

impl<R: ReadRepository> RedirectorService<R> {
    pub fn new(repository: R, settings: RedirectorSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn settings(&self) -> &RedirectorSettings {
        &self.settings
    }

    /// `{base_url}/`, whatever trailing slashes the configured base had.
    fn link_prefix(&self) -> String {
        format!("{}/", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl<R: ReadRepository> Redirector for RedirectorService<R> {
    async fn resolve(&self, raw_key: &str) -> Result<Option<String>> {
        let key = match self.settings.scheme.parse(raw_key) {
            Ok(key) => key,
            Err(e) => {
                debug!(key = raw_key, error = %e, "malformed key");
                return Ok(None);
            }
        };

        trace!(key = %key, "resolving key");
        let target = self.repository.get(&key).await?;

        match &target {
            Some(url) => debug!(key = %key, url = %url, "resolved key"),
            None => debug!(key = %key, "key not found"),
        }
        Ok(target)
    }

    async fn check_own_key(&self, short_url: &str) -> Result<Option<String>> {
        let prefix = self.link_prefix();

        let raw_key = match short_url.strip_prefix(prefix.as_str()) {
            Some(raw_key) if self.settings.scheme.accepts(raw_key) => raw_key,
            _ => {
                debug!(url = short_url, "foreign short link");
                return Err(RedirectorError::ForeignKey(short_url.to_string()));
            }
        };

        self.resolve(raw_key).await
    }
}
