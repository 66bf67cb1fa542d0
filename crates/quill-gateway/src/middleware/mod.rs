//! Pipeline stages.
//!
//! One module per cross-cutting concern. The stages are composed once, in a
//! fixed total order, by [`crate::server::build_router`]; each stage either
//! short-circuits with a terminal response or forwards to the next.

pub mod access_log;
pub mod auth;
pub mod cors;
pub mod metrics;
pub mod rate_limit;
pub mod request_id;
pub mod timeout;

pub use rate_limit::RateLimiter;
pub use request_id::RequestId;
