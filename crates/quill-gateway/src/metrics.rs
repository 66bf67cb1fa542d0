//! Prometheus metrics sink.
//!
//! One [`Metrics`] instance is constructed at startup and shared by
//! reference with every stage that records observations. Nothing here is
//! global state: the registry and all collectors live inside the struct.

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

/// Shared metrics registry and collectors.
pub struct Metrics {
    registry: Registry,
    /// HTTP requests by method, path, and final status code.
    pub requests_total: IntCounterVec,
    /// Polish inference latency per model, in seconds.
    pub polish_duration: HistogramVec,
    /// Distribution of polish input text lengths, in characters.
    pub input_chars: Histogram,
    /// Whether each backend was reachable at the last health check (1/0).
    pub backend_available: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("quill_requests_total", "Total HTTP requests processed."),
            &["method", "path", "status"],
        )
        .expect("valid counter definition");

        let polish_duration = HistogramVec::new(
            HistogramOpts::new(
                "quill_polish_duration_seconds",
                "Time spent on polish inference.",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
            &["model"],
        )
        .expect("valid histogram definition");

        let input_chars = Histogram::with_opts(
            HistogramOpts::new(
                "quill_input_chars",
                "Number of characters in polish input text.",
            )
            .buckets(vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]),
        )
        .expect("valid histogram definition");

        let backend_available = IntGaugeVec::new(
            Opts::new(
                "quill_backend_available",
                "Whether an LLM backend is available (1) or not (0).",
            ),
            &["backend"],
        )
        .expect("valid gauge definition");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("register requests_total");
        registry
            .register(Box::new(polish_duration.clone()))
            .expect("register polish_duration");
        registry
            .register(Box::new(input_chars.clone()))
            .expect("register input_chars");
        registry
            .register(Box::new(backend_available.clone()))
            .expect("register backend_available");

        Self {
            registry,
            requests_total,
            polish_duration,
            input_chars,
            backend_available,
        }
    }

    /// Render all collectors in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            tracing::error!(error = %e, "metrics encoding failed");
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
