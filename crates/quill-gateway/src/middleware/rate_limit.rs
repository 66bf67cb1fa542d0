//! Per-client sliding-window rate limiting.
//!
//! [`RateLimiter`] is the admission structure; [`throttle`] is the pipeline
//! stage that applies it to anonymous traffic. Requests marked trusted by
//! the identity gate are exempt.

use crate::error::ApiError;
use crate::middleware::auth::AuthenticatedClient;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::warn;

/// Sliding-window rate limiter keyed by client identity.
///
/// Each key holds the timestamps of its admitted requests. On every call
/// the record is compacted to the trailing window before the limit check,
/// so a key that goes quiet for a full window regains its whole budget.
/// Entries are created lazily and never removed; there is no background
/// sweep.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter admitting `limit` requests per `window` per key.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Return `true` if a request from `key` is admitted now.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock();

        let record = requests.entry(key.to_string()).or_default();
        record.retain(|t| now.duration_since(*t) < self.window);

        if record.len() >= self.limit {
            return false;
        }
        record.push(now);
        true
    }
}

/// Derive the client identity key for throttling.
///
/// A trusted forwarded-identity header wins (first hop), then the peer
/// address recorded at accept time.
pub(crate) fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Throttle stage: reject anonymous clients that exceed their budget.
pub async fn throttle(State(state): State<AppState>, req: Request, next: Next) -> Response {
    // Authenticated callers are not subject to anonymous throttling.
    if req.extensions().get::<AuthenticatedClient>().is_none() {
        let client = client_key(&req);
        if !state.rate_limiter.allow(&client) {
            warn!(client = %client, "rate limit exceeded");
            return ApiError::RateLimited.into_response();
        }
    }
    next.run(req).await
}
