//! Test fixtures shared across snip crates.

pub mod doubles;
pub mod error;
pub mod postgres;

pub use doubles::{AlwaysConflicting, CountingRepository, FlakyRepository};
pub use error::{Result, TestInfraError};
