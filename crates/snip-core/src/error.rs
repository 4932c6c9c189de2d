use thiserror::Error;

/// Errors related to the core key types.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Errors reported by a key-value store.
///
/// A confirmed absence is not an error; reads report it as `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("key already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Whether this is the insert-if-absent duplicate signal.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}
