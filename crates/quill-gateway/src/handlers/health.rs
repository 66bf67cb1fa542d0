//! Health endpoint.
//!
//! `GET /api/health` — liveness plus per-backend availability. Probes run
//! concurrently so the aggregate latency is bounded by the slowest single
//! probe, not their sum.

use crate::state::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backends: HashMap<String, BackendStatus>,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let probes = state.registry.iter().map(|(id, backend)| async move {
        let available = backend.available().await;
        let reason = (!available).then(|| backend.unavailable_reason());
        (id.to_string(), BackendStatus { available, reason })
    });

    let mut backends = HashMap::new();
    for (id, status) in join_all(probes).await {
        state
            .metrics
            .backend_available
            .with_label_values(&[id.as_str()])
            .set(i64::from(status.available));
        backends.insert(id, status);
    }

    Json(HealthResponse {
        status: "ok",
        backends,
    })
}
