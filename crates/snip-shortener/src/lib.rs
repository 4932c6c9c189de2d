//! URL shortening.
//!
//! [`ShortenerService`] validates a target URL, mints a key through a
//! [`snip_generator::KeyGenerator`] and primes the resolution cache.

pub mod error;
pub mod service;
pub mod shortener;

pub use error::ShortenerError;
pub use service::{ShortenerService, ShortenerSettings};
pub use shortener::Shortener;
