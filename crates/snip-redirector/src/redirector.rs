use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a raw key to its target URL.
    /// Returns `None` if the key is malformed or does not exist.
    async fn resolve(&self, raw_key: &str) -> Result<Option<String>>;

    /// Resolves a full short link, provided it points at this service.
    ///
    /// Links for other hosts are rejected with
    /// [`crate::RedirectorError::ForeignKey`] and never followed.
    async fn check_own_key(&self, short_url: &str) -> Result<Option<String>>;
}
