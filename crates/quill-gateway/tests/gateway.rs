//! End-to-end tests driving the full router through `tower::ServiceExt`.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use quill_gateway::backend::{Backend, BackendError, BackendRegistry, MockBackend, ModelInfo};
use quill_gateway::metrics::Metrics;
use quill_gateway::middleware::RateLimiter;
use quill_gateway::server::build_router;
use quill_gateway::state::AppState;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tower::ServiceExt;

const SYSTEM_PROMPT: &str = "Polish the text.";

struct TestGateway {
    api_key: Option<String>,
    rate_limit: usize,
    deadline: Duration,
    registry: BackendRegistry,
}

impl TestGateway {
    fn new() -> Self {
        let mut registry = BackendRegistry::new();
        registry
            .register(
                ModelInfo::new("mock", "Mock (dev)", "mock"),
                Arc::new(MockBackend::new(Duration::ZERO)),
            )
            .unwrap();
        Self {
            api_key: None,
            rate_limit: 1000,
            deadline: Duration::from_secs(120),
            registry,
        }
    }

    fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    fn with_rate_limit(mut self, limit: usize) -> Self {
        self.rate_limit = limit;
        self
    }

    fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn with_backend(mut self, id: &str, backend: Arc<dyn Backend>) -> Self {
        self.registry
            .register(ModelInfo::new(id, id, "test"), backend)
            .unwrap();
        self
    }

    fn build(self) -> Router {
        let state = AppState::new(
            Arc::new(self.registry),
            Arc::new(RateLimiter::new(self.rate_limit, Duration::from_secs(60))),
            Arc::new(Metrics::new()),
            self.api_key,
            SYSTEM_PROMPT,
            self.deadline,
        );
        build_router(state)
    }
}

fn polish_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/polish")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Polish dispatch ──────────────────────────────────────────────────────

#[tokio::test]
async fn polish_round_trip() {
    let app = TestGateway::new().build();
    let resp = app
        .oneshot(polish_request(&json!({"text": "hello there", "model_id": "mock"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["result"], "Hello there");
    assert_eq!(body["model"], "mock");
    assert!(body["elapsed_ms"].as_u64().is_some());
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let app = TestGateway::new().build();
    let resp = app
        .oneshot(polish_request(&json!({"text": "", "model_id": "mock"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "text is required");
}

#[tokio::test]
async fn missing_model_id_is_rejected() {
    let app = TestGateway::new().build();
    let resp = app
        .oneshot(polish_request(&json!({"text": "hello"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "model_id is required");
}

#[tokio::test]
async fn unknown_model_names_the_identifier() {
    let app = TestGateway::new().build();
    let resp = app
        .oneshot(polish_request(&json!({"text": "hello", "model_id": "ghost"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = TestGateway::new().build();
    let req = Request::builder()
        .method("POST")
        .uri("/api/polish")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid JSON body");
}

#[tokio::test]
async fn text_at_max_length_is_accepted() {
    let app = TestGateway::new().build();
    let text = "a".repeat(10_000);
    let resp = app
        .oneshot(polish_request(&json!({"text": text, "model_id": "mock"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn text_over_max_length_names_both_lengths() {
    let app = TestGateway::new().build();
    let text = "a".repeat(10_001);
    let resp = app
        .oneshot(polish_request(&json!({"text": text, "model_id": "mock"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains("10001"), "observed length missing: {msg}");
    assert!(msg.contains("10000"), "maximum length missing: {msg}");
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let app = TestGateway::new().build();
    // Past the 64 KiB body ceiling before the 10k-char text check can run.
    let resp = app
        .oneshot(polish_request(
            &json!({"text": "x".repeat(80 * 1024), "model_id": "mock"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(resp).await["error"], "request body too large");
}

struct FailingBackend;

#[async_trait]
impl Backend for FailingBackend {
    fn name(&self) -> String {
        "Failing".to_string()
    }

    async fn polish(&self, _text: &str, _system_prompt: &str) -> Result<String, BackendError> {
        Err(BackendError::Api {
            backend: "failing",
            message: "model exploded".to_string(),
        })
    }

    async fn available(&self) -> bool {
        false
    }

    fn unavailable_reason(&self) -> &'static str {
        "always down"
    }
}

#[tokio::test]
async fn backend_failure_translates_to_502() {
    let app = TestGateway::new()
        .with_backend("failing", Arc::new(FailingBackend))
        .build();
    let resp = app
        .oneshot(polish_request(&json!({"text": "hello", "model_id": "failing"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(resp).await;
    let msg = body["error"].as_str().unwrap();
    assert!(msg.starts_with("polish failed: "), "missing prefix: {msg}");
    assert!(msg.contains("model exploded"), "backend message lost: {msg}");
}

// ── Discovery & health ───────────────────────────────────────────────────

#[tokio::test]
async fn models_list_is_ordered_and_idempotent() {
    let app = TestGateway::new()
        .with_backend("beta", Arc::new(MockBackend::new(Duration::ZERO)))
        .with_backend("alpha", Arc::new(MockBackend::new(Duration::ZERO)))
        .build();

    let first = body_json(app.clone().oneshot(get_request("/api/models")).await.unwrap()).await;
    let second = body_json(app.oneshot(get_request("/api/models")).await.unwrap()).await;

    assert_eq!(first, second);
    let ids: Vec<&str> = first
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["mock", "beta", "alpha"]);
    assert_eq!(first[0]["name"], "Mock (dev)");
    assert_eq!(first[0]["provider"], "mock");
}

#[tokio::test]
async fn health_reports_per_backend_availability() {
    let app = TestGateway::new()
        .with_backend("failing", Arc::new(FailingBackend))
        .build();
    let resp = app.oneshot(get_request("/api/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backends"]["mock"]["available"], true);
    assert_eq!(body["backends"]["mock"].get("reason"), None);
    assert_eq!(body["backends"]["failing"]["available"], false);
    assert_eq!(body["backends"]["failing"]["reason"], "always down");
}

// ── Identity gate ────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_api_key_is_401() {
    let app = TestGateway::new().with_api_key("abc").build();
    let resp = app
        .oneshot(polish_request(&json!({"text": "hello", "model_id": "mock"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "missing API key");
}

#[tokio::test]
async fn wrong_api_key_is_401() {
    let app = TestGateway::new().with_api_key("abc").build();
    let mut req = polish_request(&json!({"text": "hello", "model_id": "mock"}));
    req.headers_mut()
        .insert("x-api-key", "xyz".parse().unwrap());
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "invalid API key");
}

#[tokio::test]
async fn valid_api_key_proceeds() {
    let app = TestGateway::new().with_api_key("abc").build();
    let mut req = polish_request(&json!({"text": "hello", "model_id": "mock"}));
    req.headers_mut()
        .insert("x-api-key", "abc".parse().unwrap());
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn monitoring_paths_bypass_the_gate() {
    let app = TestGateway::new().with_api_key("abc").build();

    let health = app.clone().oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let metrics = app.clone().oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);

    let models = app.oneshot(get_request("/api/models")).await.unwrap();
    assert_eq!(models.status(), StatusCode::UNAUTHORIZED);
}

// ── Throttle ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_traffic_is_throttled_per_client() {
    let app = TestGateway::new().with_rate_limit(2).build();

    for _ in 0..2 {
        let mut req = polish_request(&json!({"text": "hello", "model_id": "mock"}));
        req.headers_mut()
            .insert("x-forwarded-for", "1.2.3.4".parse().unwrap());
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let mut denied = polish_request(&json!({"text": "hello", "model_id": "mock"}));
    denied
        .headers_mut()
        .insert("x-forwarded-for", "1.2.3.4".parse().unwrap());
    let resp = app.clone().oneshot(denied).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(resp).await["error"], "rate limit exceeded");

    // A different client still has its full budget.
    let mut other = polish_request(&json!({"text": "hello", "model_id": "mock"}));
    other
        .headers_mut()
        .insert("x-forwarded-for", "5.6.7.8".parse().unwrap());
    let resp = app.oneshot(other).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn authenticated_requests_are_exempt_from_throttle() {
    // Zero budget: every anonymous request would be denied.
    let app = TestGateway::new()
        .with_api_key("abc")
        .with_rate_limit(0)
        .build();

    for _ in 0..3 {
        let mut req = polish_request(&json!({"text": "hello", "model_id": "mock"}));
        req.headers_mut()
            .insert("x-api-key", "abc".parse().unwrap());
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

// ── Cross-cutting headers ────────────────────────────────────────────────

#[tokio::test]
async fn every_response_carries_cors_and_request_id() {
    let app = TestGateway::new().build();

    for req in [
        get_request("/api/health"),
        get_request("/api/models"),
        polish_request(&json!({"text": "", "model_id": "mock"})),
    ] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()["access-control-allow-origin"], "*",
            "missing CORS header"
        );
        let id = resp.headers()["x-request-id"].to_str().unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[tokio::test]
async fn options_preflight_short_circuits_with_204() {
    let app = TestGateway::new().build();
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/polish")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert!(
        resp.headers()["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .contains("X-Api-Key")
    );
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

// ── Deadline & cancellation ──────────────────────────────────────────────

/// Records whether its in-flight call was dropped before completing.
struct RecordingBackend {
    canceled: Arc<AtomicBool>,
}

struct CancelGuard {
    canceled: Arc<AtomicBool>,
    completed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.canceled.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    fn name(&self) -> String {
        "Recording".to_string()
    }

    async fn polish(&self, _text: &str, _system_prompt: &str) -> Result<String, BackendError> {
        let mut guard = CancelGuard {
            canceled: Arc::clone(&self.canceled),
            completed: false,
        };
        tokio::time::sleep(Duration::from_secs(30)).await;
        guard.completed = true;
        Ok("too late".to_string())
    }

    async fn available(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn deadline_expiry_returns_timeout_and_cancels_the_backend_call() {
    let canceled = Arc::new(AtomicBool::new(false));
    let app = TestGateway::new()
        .with_deadline(Duration::from_millis(50))
        .with_backend(
            "slow",
            Arc::new(RecordingBackend {
                canceled: Arc::clone(&canceled),
            }),
        )
        .build();

    let resp = app
        .oneshot(polish_request(&json!({"text": "hello", "model_id": "slow"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(resp).await["error"], "request timeout");
    assert!(
        canceled.load(Ordering::SeqCst),
        "backend call was not canceled"
    );
}

// ── Concurrency ──────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_requests_succeed_with_distinct_request_ids() {
    let app = TestGateway::new().build();

    let calls = (0..10).map(|i| {
        let app = app.clone();
        async move {
            let resp = app
                .oneshot(polish_request(
                    &json!({"text": format!("message {i}"), "model_id": "mock"}),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            resp.headers()["x-request-id"].to_str().unwrap().to_string()
        }
    });

    let ids = futures::future::join_all(calls).await;
    let distinct: std::collections::HashSet<&String> = ids.iter().collect();
    assert_eq!(distinct.len(), 10);
}

// ── Metrics exposition ───────────────────────────────────────────────────

#[tokio::test]
async fn metrics_exposition_reflects_traffic() {
    let app = TestGateway::new().build();

    let resp = app
        .clone()
        .oneshot(polish_request(&json!({"text": "hello", "model_id": "mock"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(
        resp.into_body().collect().await.unwrap().to_bytes().to_vec(),
    )
    .unwrap();

    assert!(text.contains("quill_requests_total"));
    assert!(text.contains("path=\"/api/polish\""));
    assert!(text.contains("quill_polish_duration_seconds"));
    assert!(text.contains("quill_input_chars"));
}
