//! Gateway error types.
//!
//! Every failure leaving the gateway is one of these variants, rendered as
//! the uniform JSON envelope `{"error": "<message>"}` with a status code
//! that identifies its class: 4xx for client-fixable problems, 401 for
//! credentials, 413 for oversized payloads, 429 for throttling, 502 for
//! backend failures, and 504 for deadline expiry. Response bodies never
//! carry internal diagnostics.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Gateway-level errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("missing API key")]
    MissingApiKey,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("polish failed: {0}")]
    Upstream(String),

    #[error("request timeout")]
    Timeout,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey | ApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
