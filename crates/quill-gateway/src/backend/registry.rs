//! In-memory backend registry.
//!
//! Built once at startup and immutable afterwards: lookups need no
//! synchronization. Registration order is preserved so discovery responses
//! are stable across calls.

use super::{Backend, ModelInfo};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate backend id: {0}")]
    Duplicate(String),
}

/// Insertion-ordered mapping from model identifier to backend instance.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
    models: Vec<ModelInfo>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under `info.id`. Identifiers are unique keys;
    /// a second registration of the same id is rejected.
    pub fn register(
        &mut self,
        info: ModelInfo,
        backend: Arc<dyn Backend>,
    ) -> Result<(), RegistryError> {
        if self.backends.contains_key(&info.id) {
            return Err(RegistryError::Duplicate(info.id));
        }
        self.backends.insert(info.id.clone(), backend);
        self.models.push(info);
        Ok(())
    }

    /// Look up a backend by model identifier.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Backend>> {
        self.backends.get(id)
    }

    /// The discovery list, in registration order.
    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Iterate `(id, backend)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Backend>)> {
        self.models.iter().map(|m| {
            let backend = self
                .backends
                .get(&m.id)
                .expect("models list and backend map stay in sync");
            (m.id.as_str(), backend)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }
}
