use crate::error::Result;
use async_trait::async_trait;
use snip_core::ShortKey;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens `raw_url` and returns the key that now resolves to it.
    async fn shorten(&self, raw_url: &str) -> Result<ShortKey>;
}
