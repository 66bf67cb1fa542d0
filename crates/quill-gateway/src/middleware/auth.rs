//! Shared-secret identity gate.
//!
//! Requests carry the secret in the `x-api-key` header. When no secret is
//! configured the gate is inert. Health and metrics paths bypass the gate
//! so monitoring stays reachable without credentials.
//!
//! The comparison runs in constant time over the key bytes; only the
//! length mismatch itself is observable, matching the guarantee of the
//! usual constant-time-compare primitives.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Paths reachable without credentials.
const EXEMPT_PATHS: &[&str] = &["/api/health", "/metrics"];

/// Marker inserted into request extensions after a successful credential
/// check. Downstream stages treat marked requests as trusted.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedClient;

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Identity stage: require a valid `x-api-key` header on non-exempt paths.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };

    if EXEMPT_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    match provided {
        None => {
            warn!(path = %req.uri().path(), "rejected request: missing API key");
            ApiError::MissingApiKey.into_response()
        }
        Some(key) if !keys_match(key, expected) => {
            warn!(path = %req.uri().path(), "rejected request: invalid API key");
            ApiError::InvalidApiKey.into_response()
        }
        Some(_) => {
            req.extensions_mut().insert(AuthenticatedClient);
            next.run(req).await
        }
    }
}
