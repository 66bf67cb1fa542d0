//! llama.cpp server backend.
//!
//! llama-server exposes an OpenAI-compatible chat completion endpoint;
//! this client uses `POST {base_url}/v1/chat/completions` and reads the
//! first choice.

use super::{Backend, BackendError, PROBE_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for a llama-server instance.
pub struct LlamaCppBackend {
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl LlamaCppBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        }
    }
}

#[async_trait]
impl Backend for LlamaCppBackend {
    fn name(&self) -> String {
        format!("llama.cpp ({})", self.model)
    }

    async fn polish(&self, text: &str, system_prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "forwarding to llama-server");

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                backend: "llamacpp",
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                backend: "llamacpp",
                status: status.as_u16(),
            });
        }

        let chat: ChatResponse = resp.json().await.map_err(|source| BackendError::Decode {
            backend: "llamacpp",
            source,
        })?;

        let Some(choice) = chat.choices.first() else {
            return Err(BackendError::Empty { backend: "llamacpp" });
        };

        Ok(choice.message.content.trim().to_string())
    }

    async fn available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn unavailable_reason(&self) -> &'static str {
        "llama-server unreachable"
    }
}
