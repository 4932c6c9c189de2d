use crate::KeyGenerator;
use async_trait::async_trait;
use rand::Rng;
use snip_core::{KeyScheme, Repository, ShortKey, StorageError, UrlRecord, LETTERS};
use tracing::trace;

/// Draws `length` independent uniform samples from [`LETTERS`].
///
/// This is a usability key, not a security token: a thread-local,
/// non-cryptographic RNG is enough because uniqueness is enforced by the store.
pub fn random_key(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
        .collect()
}

/// Mints random letter keys and stores them with insert-if-absent.
///
/// With the default length the key space is 52^6, so a collision is rare but
/// possible; it surfaces as [`StorageError::Conflict`].
#[derive(Debug, Clone)]
pub struct RandomKeyGenerator<R> {
    repository: R,
    length: usize,
}

impl<R: Repository> RandomKeyGenerator<R> {
    /// Creates a generator producing keys of the default length.
    pub fn new(repository: R) -> Self {
        Self::with_length(repository, KeyScheme::DEFAULT_RANDOM_LENGTH)
    }

    /// Creates a generator producing keys of `length` letters.
    pub fn with_length(repository: R, length: usize) -> Self {
        Self { repository, length }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

#[async_trait]
impl<R: Repository> KeyGenerator for RandomKeyGenerator<R> {
    fn scheme(&self) -> KeyScheme {
        KeyScheme::Random {
            length: self.length,
        }
    }

    async fn mint(&self, target: &str) -> Result<ShortKey, StorageError> {
        let key = ShortKey::new_unchecked(random_key(self.length));
        trace!(key = %key, "trying random key");

        self.repository
            .insert(&UrlRecord::new(key.clone(), target))
            .await?;

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_core::ReadRepository;
    use snip_storage::InMemoryRepository;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn random_key_has_requested_length_and_alphabet() {
        for length in [1, 6, 12] {
            let key = random_key(length);
            assert_eq!(key.len(), length);
            assert!(key.bytes().all(|b| b.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn random_key_of_zero_length_is_empty() {
        assert!(random_key(0).is_empty());
    }

    #[test]
    fn random_keys_are_spread_out() {
        let keys: HashSet<String> = (0..1_000).map(|_| random_key(6)).collect();
        // 1000 draws from 52^6 should practically never collide
        assert!(keys.len() > 990);
    }

    #[test]
    fn random_key_draws_both_cases() {
        let joined: String = (0..200).map(|_| random_key(6)).collect();
        assert!(joined.bytes().any(|b| b.is_ascii_lowercase()));
        assert!(joined.bytes().any(|b| b.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn mint_persists_mapping() {
        let repo = Arc::new(InMemoryRepository::new());
        let generator = RandomKeyGenerator::new(Arc::clone(&repo));

        let key = generator.mint("https://example.com").await.unwrap();

        assert!(generator.scheme().accepts(key.as_str()));
        assert_eq!(
            repo.get(&key).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn mint_reports_conflict_when_key_space_is_full() {
        let repo = Arc::new(InMemoryRepository::new());
        for &letter in LETTERS.iter() {
            let key = ShortKey::new_unchecked((letter as char).to_string());
            repo.insert(&UrlRecord::new(key, "https://taken.example"))
                .await
                .unwrap();
        }

        let generator = RandomKeyGenerator::with_length(Arc::clone(&repo), 1);
        let err = generator.mint("https://example.com").await.unwrap_err();

        assert!(err.is_conflict());
    }

    #[test]
    fn scheme_reflects_length() {
        let generator = RandomKeyGenerator::with_length(InMemoryRepository::new(), 8);
        assert_eq!(generator.scheme(), KeyScheme::Random { length: 8 });
    }
}
