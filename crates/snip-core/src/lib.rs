//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the key codec, the short key type and the store
//! contracts shared by the shortener and the redirector.

pub mod base62;
pub mod error;
pub mod repository;
pub mod shortkey;

pub use error::{CoreError, StorageError};
pub use repository::{ReadRepository, Repository, SequenceRepository, UrlRecord};
pub use shortkey::{KeyScheme, ShortKey, LETTERS};
