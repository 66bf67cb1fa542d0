//! `quill-gateway` — HTTP gateway for interchangeable text-polishing
//! backends.
//!
//! One uniform JSON API fronts several LLM rewriting providers; the
//! gateway enforces cross-cutting policy before dispatching to the backend
//! selected by the caller's model id:
//!
//! | Concern | Implementation |
//! |---------|----------------|
//! | Backend contract | [`backend::Backend`] |
//! | Backend registry | [`backend::BackendRegistry`] |
//! | Rate limiting | [`middleware::RateLimiter`] + throttle stage |
//! | Identity gate | [`middleware::auth`] |
//! | Correlation ids | [`middleware::request_id`] |
//! | Metrics | [`metrics::Metrics`] |
//!
//! [`server::build_router`] composes the stages in a fixed order around the
//! handlers; [`server::serve`] runs the result.

pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod state;
