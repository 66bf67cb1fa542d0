//! Router construction and serving.
//!
//! [`build_router`] wires the handlers behind the fixed middleware
//! pipeline; [`serve`] binds a listener and runs until a shutdown signal.
//!
//! Stage order, outermost to innermost:
//! CORS → CorrelationID → AccessLog → Metrics → Identity → Throttle →
//! BodySizeLimit → DeadlineEnforcement → router. Identity runs before
//! Throttle so that invalid credentials are rejected without consuming
//! rate-limit budget and authenticated requests skip throttling.

use crate::handlers;
use crate::middleware::{access_log, auth, cors, metrics, rate_limit, request_id, timeout};
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tracing::info;

/// Request body ceiling.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the axum [`Router`] with the full pipeline attached.
pub fn build_router(state: AppState) -> Router {
    let pipeline = ServiceBuilder::new()
        .layer(from_fn(cors::cors))
        .layer(from_fn(request_id::correlation_id))
        .layer(from_fn(access_log::access_log))
        .layer(from_fn_with_state(state.clone(), metrics::track_requests))
        .layer(from_fn_with_state(state.clone(), auth::require_api_key))
        .layer(from_fn_with_state(state.clone(), rate_limit::throttle))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn_with_state(state.clone(), timeout::enforce_deadline));

    Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/models", get(handlers::models::models))
        .route("/api/polish", post(handlers::polish::polish))
        .route("/metrics", get(handlers::metrics::metrics))
        .layer(pipeline)
        .with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until SIGINT or SIGTERM.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("0.0.0.0:{port}");
    info!(addr = %addr, "quill gateway listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
