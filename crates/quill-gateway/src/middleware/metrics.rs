//! Request-counting stage.
//!
//! Increments the shared requests counter by method, path, and the final
//! status code once the inner stack has produced its response.

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let resp = next.run(req).await;

    let status = resp.status().as_u16().to_string();
    state
        .metrics
        .requests_total
        .with_label_values(&[method.as_str(), path.as_str(), status.as_str()])
        .inc();
    resp
}
