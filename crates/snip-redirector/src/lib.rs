//! Key resolution with read-through caching.
//!
//! [`RedirectorService`] checks the key shape, then reads through a
//! [`CachedRepository`] that remembers both hits and confirmed misses.
//!
//! ```rust
//! use snip_cache::MokaUrlCache;
//! use snip_core::KeyScheme;
//! use snip_redirector::{CachedRepository, Redirector, RedirectorService, RedirectorSettings};
//! use snip_storage::InMemoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = CachedRepository::new(InMemoryRepository::new(), MokaUrlCache::new());
//! let settings = RedirectorSettings::builder()
//!     .base_url("https://sn.ip")
//!     .scheme(KeyScheme::random())
//!     .build();
//! let service = RedirectorService::new(repository, settings);
//!
//! if let Some(url) = service.resolve("abcDEF").await? {
//!     println!("Redirect to: {}", url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod redirector;
pub mod repository;
pub mod service;

pub use error::{RedirectorError, Result};
pub use redirector::Redirector;
pub use repository::CachedRepository;
pub use service::{RedirectorService, RedirectorSettings};
