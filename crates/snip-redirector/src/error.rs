use snip_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedirectorError>;

#[derive(Debug, Clone, Error)]
pub enum RedirectorError {
    #[error("not one of our keys: {0}")]
    ForeignKey(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RedirectorError {
    /// Whether the caller sent something unusable, as opposed to a fault.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, RedirectorError::ForeignKey(_))
    }
}
