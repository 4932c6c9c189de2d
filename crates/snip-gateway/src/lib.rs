//! Plain-text HTTP front end for the snip shortener.

pub mod app;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::{App, MAX_BODY_BYTES, REQUEST_TIMEOUT, SHUTDOWN_GRACE};
pub use error::AppError;
pub use state::{AppState, GatewaySettings};
