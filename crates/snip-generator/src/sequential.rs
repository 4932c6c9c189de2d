use crate::KeyGenerator;
use async_trait::async_trait;
use snip_core::{KeyScheme, SequenceRepository, ShortKey, StorageError};
use tracing::trace;

/// Mints keys from identifiers assigned by the store.
///
/// The store inserts the URL and returns its identifier atomically, and the
/// identifier is rendered as base-62. Submitting the same URL twice yields
/// the same key, because the store returns the existing identifier.
#[derive(Debug, Clone)]
pub struct SequentialKeyGenerator<S> {
    repository: S,
}

impl<S: SequenceRepository> SequentialKeyGenerator<S> {
    pub fn new(repository: S) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &S {
        &self.repository
    }
}

#[async_trait]
impl<S: SequenceRepository> KeyGenerator for SequentialKeyGenerator<S> {
    fn scheme(&self) -> KeyScheme {
        KeyScheme::Sequential
    }

    async fn mint(&self, target: &str) -> Result<ShortKey, StorageError> {
        let id = self.repository.insert_returning_id(target).await?;
        let id = u64::try_from(id).map_err(|_| {
            StorageError::InvalidData(format!("store assigned a negative id: {}", id))
        })?;

        let key = ShortKey::from_id(id);
        trace!(id, key = %key, "minted sequential key");
        Ok(key)
    }
}
