//! Bounded, non-authoritative caches of key resolutions.

pub mod cache;
pub mod moka;

pub use cache::{CacheEntry, UrlCache};
pub use moka::{CacheConfig, MokaUrlCache};
