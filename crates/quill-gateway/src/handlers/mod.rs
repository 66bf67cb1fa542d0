//! HTTP handlers.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/health` | Liveness + per-backend availability. |
//! | `GET`  | `/api/models` | Ordered discovery list. |
//! | `POST` | `/api/polish` | Dispatch a rewrite to the selected backend. |
//! | `GET`  | `/metrics` | Prometheus text exposition. |

pub mod health;
pub mod metrics;
pub mod models;
pub mod polish;
