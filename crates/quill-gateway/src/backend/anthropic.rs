//! Anthropic Messages API backend.
//!
//! [`AnthropicBackend`] sends the polish request as a single-turn
//! conversation to `{base_url}/v1/messages` and concatenates the text
//! blocks of the reply. The response JSON is parsed into typed structs so
//! provider error messages can be surfaced verbatim to the dispatch layer.

use super::{Backend, BackendError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Client for the Anthropic Messages API.
pub struct AnthropicBackend {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AnthropicBackend {
    /// Create a new backend client.
    ///
    /// - `base_url`: `None` uses the public Anthropic endpoint.
    /// - `api_key`: may be empty; the backend then reports unavailable.
    /// - `model`: Anthropic model id sent with every request.
    pub fn new(base_url: Option<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn name(&self) -> String {
        format!("Claude ({})", self.model)
    }

    async fn polish(&self, text: &str, system_prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(url = %url, model = %self.model, "forwarding to Anthropic");

        let body = MessagesRequest {
            model: &self.model,
            system: system_prompt,
            messages: vec![Message {
                role: "user",
                content: text,
            }],
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                backend: "anthropic",
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            // Prefer the structured API error message when the body carries one.
            return match resp.json::<ErrorResponse>().await {
                Ok(err) if !err.error.message.is_empty() => Err(BackendError::Api {
                    backend: "anthropic",
                    message: err.error.message,
                }),
                _ => Err(BackendError::Status {
                    backend: "anthropic",
                    status: status.as_u16(),
                }),
            };
        }

        let msg: MessagesResponse =
            resp.json().await.map_err(|source| BackendError::Decode {
                backend: "anthropic",
                source,
            })?;

        if msg.content.is_empty() {
            return Err(BackendError::Empty {
                backend: "anthropic",
            });
        }

        let mut result = String::new();
        for block in &msg.content {
            if block.kind == "text" {
                result.push_str(&block.text);
            }
        }
        Ok(result.trim().to_string())
    }

    async fn available(&self) -> bool {
        // A configured key is the readiness signal; no probe call is made
        // against the paid API.
        !self.api_key.is_empty()
    }

    fn unavailable_reason(&self) -> &'static str {
        "no API key"
    }
}
