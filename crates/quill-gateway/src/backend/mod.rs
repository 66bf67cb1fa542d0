//! Backend module.
//!
//! [`Backend`] is the capability contract every text-polishing backend
//! satisfies. Concrete clients front one provider each; the
//! [`registry::BackendRegistry`] maps caller-supplied model identifiers to
//! live backend instances.

mod anthropic;
mod llamacpp;
mod mock;
mod ollama;
pub mod registry;

pub use anthropic::AnthropicBackend;
pub use llamacpp::LlamaCppBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use registry::BackendRegistry;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Bound on availability probes. A probe may hit the network but must
/// return within this budget.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors produced by backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{backend}: request: {source}")]
    Request {
        backend: &'static str,
        source: reqwest::Error,
    },

    #[error("{backend}: unexpected status {status}")]
    Status { backend: &'static str, status: u16 },

    #[error("{backend}: API error: {message}")]
    Api {
        backend: &'static str,
        message: String,
    },

    #[error("{backend}: decode response: {source}")]
    Decode {
        backend: &'static str,
        source: reqwest::Error,
    },

    #[error("{backend}: empty response content")]
    Empty { backend: &'static str },
}

/// Contract every text-polishing backend satisfies.
///
/// `polish` runs under the caller's deadline: the gateway drops the future
/// when the deadline elapses or the client disconnects, which cancels any
/// in-flight HTTP request. Implementations must not detach work that would
/// outlive the call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable display name.
    fn name(&self) -> String;

    /// Rewrite `text` according to `system_prompt`.
    async fn polish(&self, text: &str, system_prompt: &str) -> Result<String, BackendError>;

    /// Cheap, side-effect-free liveness probe, bounded by [`PROBE_TIMEOUT`].
    async fn available(&self) -> bool;

    /// Why this backend reports unavailable. Each backend kind knows its own
    /// failure mode; callers never guess from the concrete type.
    fn unavailable_reason(&self) -> &'static str {
        "unavailable"
    }
}

/// Discovery entry exposed via `GET /api/models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

impl ModelInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
        }
    }
}
