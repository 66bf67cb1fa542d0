//! Deadline enforcement stage.
//!
//! Races the inner stack against the configured wall-clock bound. On
//! expiry the inner future is dropped, which cancels any in-flight backend
//! call, and the caller receives the fixed timeout envelope.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

pub async fn enforce_deadline(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    match tokio::time::timeout(state.deadline, next.run(req)).await {
        Ok(resp) => resp,
        Err(_) => {
            warn!(path = %path, deadline_secs = state.deadline.as_secs(), "request deadline exceeded");
            ApiError::Timeout.into_response()
        }
    }
}
