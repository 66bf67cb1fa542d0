//! Deterministic mock backend for development and testing.

use super::{Backend, BackendError};
use async_trait::async_trait;
use std::time::Duration;

/// Simulates a backend with a configurable delay.
///
/// The "polish" is capitalizing the first letter of the trimmed input, which
/// makes round trips assertable without a real model. The delay runs on the
/// tokio timer, so dropping the call future cancels it like a real network
/// request.
pub struct MockBackend {
    delay: Duration,
}

impl MockBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> String {
        "Mock".to_string()
    }

    async fn polish(&self, text: &str, _system_prompt: &str) -> Result<String, BackendError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        let polished = match chars.next() {
            Some(first) if first.is_lowercase() => {
                first.to_uppercase().collect::<String>() + chars.as_str()
            }
            _ => trimmed.to_string(),
        };
        Ok(polished)
    }

    async fn available(&self) -> bool {
        true
    }
}
