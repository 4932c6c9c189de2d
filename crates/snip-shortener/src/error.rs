use snip_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no free key after {attempts} attempts")]
    KeysExhausted { attempts: u32 },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ShortenerError {
    /// Whether the caller sent something unusable, as opposed to a fault.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, ShortenerError::InvalidUrl(_))
    }
}
