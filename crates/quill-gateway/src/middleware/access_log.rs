//! Access logging stage.
//!
//! Emits one structured event per request after the inner stack completes,
//! with the correlation id, method, path, final status, and elapsed time.
//! The final status is read off the completed response, so a short-circuit
//! in any inner stage is recorded as written.

use crate::middleware::request_id::RequestId;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{error, info};

pub async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| "-".to_string());

    let start = Instant::now();
    let resp = next.run(req).await;
    let status = resp.status();

    if status.is_server_error() {
        error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request completed"
        );
    }
    resp
}
