//! Key-value stores for snip.
//!
//! In-memory stores back tests and single-node runs; the PostgreSQL stores
//! are the durable backends. [`Deadline`] bounds every call to any of them.

pub mod deadline;
pub mod memory;
pub mod postgres;

pub use deadline::Deadline;
pub use memory::{InMemoryRepository, InMemorySequenceRepository};
pub use postgres::{PgRepository, PgSequenceRepository};
pub use snip_core::{ReadRepository, Repository, SequenceRepository, StorageError};
