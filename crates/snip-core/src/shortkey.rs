use crate::base62;
use crate::error::{CoreError, Result};
use smol_str::SmolStr;
use std::fmt::Display;

/// The 52 symbols of the random scheme.
pub const LETTERS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A short key identifying a stored URL.
///
/// Keys are only produced by a [`KeyScheme`] (for external input) or by a
/// key generator (for freshly minted keys), so a `ShortKey` always has the
/// shape of the scheme it came from.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShortKey(SmolStr);

impl ShortKey {
    /// Creates a `ShortKey` without validation.
    ///
    /// Use this only for keys produced by trusted internal sources.
    pub fn new_unchecked(key: impl AsRef<str>) -> Self {
        Self(SmolStr::new(key))
    }

    /// Renders a store-assigned identifier as a base-62 key.
    pub fn from_id(id: u64) -> Self {
        Self(SmolStr::new(base62::encode(id)))
    }

    /// Decodes a base-62 key back into its identifier.
    pub fn to_id(&self) -> Result<u64> {
        base62::decode(&self.0)
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates the full short link based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Debug for ShortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortKey").field(&self.0).finish()
    }
}

impl Display for ShortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How keys are minted, and therefore which shapes are admissible.
///
/// The two schemes are mutually exclusive per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    /// Fixed-length keys drawn uniformly from [`LETTERS`].
    Random { length: usize },
    /// Base-62 rendering of a store-assigned sequence number.
    Sequential,
}

impl KeyScheme {
    pub const DEFAULT_RANDOM_LENGTH: usize = 6;

    /// The random scheme with the default key length.
    pub fn random() -> Self {
        KeyScheme::Random {
            length: Self::DEFAULT_RANDOM_LENGTH,
        }
    }

    /// Validates `raw` against this scheme's shape.
    ///
    /// Sequential keys must be canonical: `"0"` or base-62 without a leading
    /// zero, so each identifier has exactly one key.
    pub fn parse(&self, raw: &str) -> Result<ShortKey> {
        match *self {
            KeyScheme::Random { length } => {
                if raw.len() != length {
                    return Err(CoreError::InvalidKey(format!(
                        "expected {} characters, got {}",
                        length,
                        raw.len()
                    )));
                }
                if !raw.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return Err(CoreError::InvalidKey(format!(
                        "must contain only ASCII letters: '{}'",
                        raw
                    )));
                }
            }
            KeyScheme::Sequential => {
                base62::decode(raw)?;
                if raw.len() > 1 && raw.starts_with('0') {
                    return Err(CoreError::InvalidKey(format!(
                        "leading zero in sequential key '{}'",
                        raw
                    )));
                }
            }
        }

        Ok(ShortKey::new_unchecked(raw))
    }

    /// Whether `raw` has the shape of a key minted under this scheme.
    pub fn accepts(&self, raw: &str) -> bool {
        self.parse(raw).is_ok()
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self::random()
    }
}

impl Display for KeyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyScheme::Random { length } => write!(f, "random({})", length),
            KeyScheme::Sequential => f.write_str("sequential"),
        }
    }
}
