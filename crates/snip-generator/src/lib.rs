//! Key generation strategies.
//!
//! A [`KeyGenerator`] mints a key for a target URL and persists the mapping.
//! Exactly one strategy is chosen when the shortener is constructed.

pub mod random;
pub mod sequential;

pub use random::{random_key, RandomKeyGenerator};
pub use sequential::SequentialKeyGenerator;

use async_trait::async_trait;
use snip_core::{KeyScheme, ShortKey, StorageError};

/// Trait for minting short keys.
///
/// Implementations can vary from random keys checked for uniqueness by the
/// store to identifiers assigned by the store itself.
#[async_trait]
pub trait KeyGenerator: Send + Sync + 'static {
    /// The scheme whose key shape this generator produces.
    fn scheme(&self) -> KeyScheme;

    /// Mints a key for `target` and persists the mapping.
    ///
    /// A key that is already taken is reported as
    /// [`StorageError::Conflict`]; the caller decides whether to retry.
    async fn mint(&self, target: &str) -> Result<ShortKey, StorageError>;
}
