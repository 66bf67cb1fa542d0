//! Ollama backend.
//!
//! Talks to a local Ollama instance via `POST {base_url}/api/chat` with
//! streaming disabled.

use super::{Backend, BackendError, PROBE_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for a local Ollama server.
pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
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
impl Backend for OllamaBackend {
    fn name(&self) -> String {
        format!("Ollama ({})", self.model)
    }

    async fn polish(&self, text: &str, system_prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(url = %url, model = %self.model, "forwarding to Ollama");

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
            stream: false,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                backend: "ollama",
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                backend: "ollama",
                status: status.as_u16(),
            });
        }

        let chat: ChatResponse = resp.json().await.map_err(|source| BackendError::Decode {
            backend: "ollama",
            source,
        })?;

        Ok(chat.message.content.trim().to_string())
    }

    async fn available(&self) -> bool {
        let url = format!("{}/", self.base_url);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn unavailable_reason(&self) -> &'static str {
        "ollama unreachable"
    }
}
