//! Model discovery endpoint.
//!
//! `GET /api/models` — the registry's discovery list, in registration
//! order. Repeated calls return an identical list; the registry never
//! changes after startup.

use crate::backend::ModelInfo;
use crate::state::AppState;
use axum::{Json, extract::State};

/// GET /api/models
pub async fn models(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    Json(state.registry.models().to_vec())
}
