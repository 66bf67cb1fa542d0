//! Shared application state.

use crate::backend::BackendRegistry;
use crate::metrics::Metrics;
use crate::middleware::RateLimiter;
use std::sync::Arc;
use std::time::Duration;

/// State shared across all request handlers and stages.
#[derive(Clone)]
pub struct AppState {
    /// Backend registry — immutable after startup.
    pub registry: Arc<BackendRegistry>,
    /// Per-client sliding-window rate limiter.
    pub rate_limiter: Arc<RateLimiter>,
    /// Shared metrics sink.
    pub metrics: Arc<Metrics>,
    /// Identity gate secret. `None` disables authentication.
    pub api_key: Option<Arc<str>>,
    /// System prompt sent to every backend.
    pub system_prompt: Arc<str>,
    /// Upper wall-clock bound on total request processing.
    pub deadline: Duration,
}

impl AppState {
    pub fn new(
        registry: Arc<BackendRegistry>,
        rate_limiter: Arc<RateLimiter>,
        metrics: Arc<Metrics>,
        api_key: Option<String>,
        system_prompt: impl Into<Arc<str>>,
        deadline: Duration,
    ) -> Self {
        Self {
            registry,
            rate_limiter,
            metrics,
            api_key: api_key.map(Arc::from),
            system_prompt: system_prompt.into(),
            deadline,
        }
    }
}
