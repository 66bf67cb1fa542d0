//! quill-gateway — entry point.
//!
//! Loads configuration (YAML file + `QUILL_*` environment overrides),
//! registers the configured backends, and starts the HTTP gateway.

use anyhow::Context;
use clap::Parser;
use quill_gateway::backend::{
    AnthropicBackend, BackendRegistry, LlamaCppBackend, MockBackend, ModelInfo, OllamaBackend,
};
use quill_gateway::config::Config;
use quill_gateway::metrics::Metrics;
use quill_gateway::middleware::RateLimiter;
use quill_gateway::server;
use quill_gateway::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quill-gateway", about = "Text-polishing gateway", version)]
struct Args {
    /// Path to the YAML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Register only the mock backend (no real LLM calls).
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("quill_gateway=info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = Config::load(args.config.as_deref()).context("load config")?;
    if let Some(port) = args.port {
        cfg.port = port;
    }

    let system_prompt = std::fs::read_to_string(&cfg.prompt_path)
        .with_context(|| format!("read prompt {}", cfg.prompt_path))?;

    let registry = Arc::new(build_registry(&cfg, args.mock)?);
    if registry.is_empty() {
        warn!("no backends configured — every polish request will fail validation");
    }

    if cfg.api_key.is_some() {
        info!("auth: API key required (x-api-key header)");
    } else {
        warn!("auth: disabled (no api_key configured) — do not expose this instance publicly");
    }

    let state = AppState::new(
        registry,
        Arc::new(RateLimiter::new(
            cfg.rate_limit,
            Duration::from_secs(cfg.rate_window_secs),
        )),
        Arc::new(Metrics::new()),
        cfg.api_key.clone(),
        system_prompt,
        Duration::from_secs(cfg.request_timeout_secs),
    );

    server::serve(state, cfg.port).await.context("serve")
}

/// Register the configured backends, most-preferred first: the local GPU
/// server, then the cloud fallback, then Ollama.
fn build_registry(cfg: &Config, use_mock: bool) -> anyhow::Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();

    if use_mock {
        registry.register(
            ModelInfo::new("mock", "Mock (dev)", "mock"),
            Arc::new(MockBackend::new(Duration::from_millis(500))),
        )?;
        info!("mode: mock backend enabled");
        return Ok(registry);
    }

    if let Some(url) = &cfg.llamacpp_url {
        let model = cfg.llamacpp_model.as_str();
        registry.register(
            ModelInfo::new(model, format!("llama.cpp ({model})"), "llamacpp"),
            Arc::new(LlamaCppBackend::new(url.as_str(), model)),
        )?;
        info!(url = %url, model = %model, "mode: llama.cpp enabled");
    }

    if let Some(key) = &cfg.anthropic_api_key {
        let model = cfg.anthropic_model.as_str();
        registry.register(
            ModelInfo::new(model, format!("Claude ({model})"), "anthropic"),
            Arc::new(AnthropicBackend::new(None, key.as_str(), model)),
        )?;
        info!(model = %model, "mode: anthropic enabled");
    }

    if let Some(url) = &cfg.ollama_url {
        let model = cfg.ollama_model.as_str();
        registry.register(
            ModelInfo::new(model, format!("Ollama ({model})"), "ollama"),
            Arc::new(OllamaBackend::new(url.as_str(), model)),
        )?;
        info!(url = %url, model = %model, "mode: ollama enabled");
    }

    Ok(registry)
}
