//! Polish dispatch endpoint.
//!
//! `POST /api/polish` — validate the request, resolve the backend by model
//! id, and dispatch a single rewrite attempt under the pipeline deadline.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Longest accepted input, in characters.
pub const MAX_TEXT_CHARS: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct PolishRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub model_id: String,
}

#[derive(Debug, Serialize)]
pub struct PolishResponse {
    pub result: String,
    pub model: String,
    pub elapsed_ms: u64,
}

/// POST /api/polish
pub async fn polish(
    State(state): State<AppState>,
    payload: Result<Json<PolishRequest>, JsonRejection>,
) -> ApiResult<Json<PolishResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidRequest("invalid JSON body".to_string())
        }
    })?;

    if req.text.is_empty() {
        return Err(ApiError::InvalidRequest("text is required".to_string()));
    }
    let chars = req.text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(ApiError::InvalidRequest(format!(
            "text too long: {chars} characters (max {MAX_TEXT_CHARS})"
        )));
    }
    if req.model_id.is_empty() {
        return Err(ApiError::InvalidRequest("model_id is required".to_string()));
    }

    let backend = state
        .registry
        .get(&req.model_id)
        .ok_or_else(|| ApiError::InvalidRequest(format!("unknown model: {}", req.model_id)))?;

    state.metrics.input_chars.observe(chars as f64);

    // Single dispatch attempt; cancellation arrives by future drop when the
    // deadline stage fires or the client disconnects.
    let start = Instant::now();
    let result = backend.polish(&req.text, &state.system_prompt).await;
    let elapsed = start.elapsed();

    state
        .metrics
        .polish_duration
        .with_label_values(&[req.model_id.as_str()])
        .observe(elapsed.as_secs_f64());

    let polished = result.map_err(|e| ApiError::Upstream(e.to_string()))?;

    info!(
        model = %req.model_id,
        input_chars = chars,
        elapsed_ms = elapsed.as_millis() as u64,
        "polish completed"
    );

    Ok(Json(PolishResponse {
        result: polished,
        model: req.model_id,
        elapsed_ms: elapsed.as_millis() as u64,
    }))
}
