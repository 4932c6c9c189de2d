use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// `POST /shorten`: the body is the long URL, the reply is the short link.
pub async fn shorten_handler(State(state): State<AppState>, body: String) -> Result<String> {
    let key = state.shortener().shorten(body.trim()).await?;
    Ok(key.to_url(state.base_url()))
}

/// `GET /{key}`: redirects to the stored target.
pub async fn redirect_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let target = state
        .redirector()
        .resolve(&key)
        .await?
        .ok_or(AppError::NotFound)?;

    let location = HeaderValue::try_from(target)
        .map_err(|e| AppError::Internal(format!("stored target is not a valid header: {}", e)))?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}

/// `POST /check`: the body is a short link, the reply is where it points.
pub async fn check_handler(State(state): State<AppState>, body: String) -> Result<String> {
    state
        .redirector()
        .check_own_key(body.trim())
        .await?
        .ok_or(AppError::NotFound)
}
