//! Per-request correlation identifier.
//!
//! A fresh 128-bit random id (hex-encoded, 32 chars) is attached to the
//! request extensions and echoed in the `x-request-id` response header.
//! The id is immutable for the rest of the request's life and shows up in
//! the access log so a response header can be matched to its log line.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id carried in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub Arc<str>);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn generate() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

pub async fn correlation_id(mut req: Request, next: Next) -> Response {
    let id = generate();
    req.extensions_mut().insert(RequestId(Arc::from(id.as_str())));

    let mut resp = next.run(req).await;
    resp.headers_mut().insert(
        REQUEST_ID_HEADER,
        HeaderValue::from_str(&id).expect("hex id is a valid header value"),
    );
    resp
}
