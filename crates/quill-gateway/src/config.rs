//! Runtime configuration.
//!
//! Configuration is resolved in three passes: built-in defaults, an optional
//! YAML file, then `QUILL_*` environment variable overrides. A backend is
//! only registered at startup when its endpoint or credential is present,
//! so an empty config still yields a bootable (if backend-less) gateway.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `QUILL_PORT` | `port` |
//! | `QUILL_API_KEY` | `api_key` |
//! | `QUILL_ANTHROPIC_API_KEY` | `anthropic_api_key` |
//! | `QUILL_ANTHROPIC_MODEL` | `anthropic_model` |
//! | `QUILL_OLLAMA_URL` | `ollama_url` |
//! | `QUILL_OLLAMA_MODEL` | `ollama_model` |
//! | `QUILL_LLAMACPP_URL` | `llamacpp_url` |
//! | `QUILL_LLAMACPP_MODEL` | `llamacpp_model` |
//! | `QUILL_PROMPT_PATH` | `prompt_path` |
//! | `QUILL_RATE_LIMIT` | `rate_limit` |
//! | `QUILL_RATE_WINDOW_SECS` | `rate_window_secs` |

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("invalid {var}={value}: expected an integer")]
    InvalidEnvNumber { var: String, value: String },
}

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// TCP port to listen on.
    pub port: u16,
    /// Shared secret for the identity gate. `None` disables authentication.
    pub api_key: Option<String>,
    /// Anthropic API key. The Anthropic backend is registered only when set.
    pub anthropic_api_key: Option<String>,
    /// Anthropic model id.
    pub anthropic_model: String,
    /// Ollama base URL. The Ollama backend is registered only when set.
    pub ollama_url: Option<String>,
    /// Ollama model id.
    pub ollama_model: String,
    /// llama.cpp server base URL. Registered only when set.
    pub llamacpp_url: Option<String>,
    /// llama.cpp model id.
    pub llamacpp_model: String,
    /// Path to the system prompt file sent to every backend.
    pub prompt_path: String,
    /// Admitted requests per client per window. Zero denies all anonymous
    /// traffic.
    pub rate_limit: usize,
    /// Sliding-window length in seconds.
    pub rate_window_secs: u64,
    /// Upper wall-clock bound on total request processing, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8090,
            api_key: None,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-5-20250929".to_string(),
            ollama_url: None,
            ollama_model: "qwen2.5:1.5b".to_string(),
            llamacpp_url: None,
            llamacpp_model: "qwen2.5-1.5b-gpu".to_string(),
            prompt_path: "prompts/polish.txt".to_string(),
            rate_limit: 10,
            rate_window_secs: 60,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the YAML file at `path` (if any),
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut cfg = match path {
            Some(p) => {
                let display = p.display().to_string();
                let data = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: display.clone(),
                    source,
                })?;
                serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
                    path: display,
                    source,
                })?
            }
            None => Config::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_var("QUILL_PORT") {
            self.port = parse_env("QUILL_PORT", &v)?;
        }
        if let Some(v) = env_var("QUILL_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = env_var("QUILL_ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(v);
        }
        if let Some(v) = env_var("QUILL_ANTHROPIC_MODEL") {
            self.anthropic_model = v;
        }
        if let Some(v) = env_var("QUILL_OLLAMA_URL") {
            self.ollama_url = Some(v);
        }
        if let Some(v) = env_var("QUILL_OLLAMA_MODEL") {
            self.ollama_model = v;
        }
        if let Some(v) = env_var("QUILL_LLAMACPP_URL") {
            self.llamacpp_url = Some(v);
        }
        if let Some(v) = env_var("QUILL_LLAMACPP_MODEL") {
            self.llamacpp_model = v;
        }
        if let Some(v) = env_var("QUILL_PROMPT_PATH") {
            self.prompt_path = v;
        }
        if let Some(v) = env_var("QUILL_RATE_LIMIT") {
            self.rate_limit = parse_env("QUILL_RATE_LIMIT", &v)?;
        }
        if let Some(v) = env_var("QUILL_RATE_WINDOW_SECS") {
            self.rate_window_secs = parse_env("QUILL_RATE_WINDOW_SECS", &v)?;
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvNumber {
        var: var.to_string(),
        value: value.to_string(),
    })
}
