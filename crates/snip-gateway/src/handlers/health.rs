use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::State;
use tracing::warn;

pub async fn health_handler(State(state): State<AppState>) -> Result<&'static str> {
    state.health().ping().await.map_err(|e| {
        warn!(error = %e, "store ping failed");
        AppError::Unavailable
    })?;
    Ok("OK")
}
