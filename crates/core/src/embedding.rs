use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(String),
    #[error("embedding response malformed: {0}")]
    Malformed(String),
}

/// Opaque `embed(text) -> vector` dependency. The engine treats this as a
/// blocking external call with no partial result; failures surface as
/// `EngineError::EmbeddingUnavailable` and are never papered over with a
/// NOT_FOUND.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Deterministic in-memory embedder for tests and seed tooling. Unknown
/// queries embed to the zero vector, which scores 0 against everything.
#[derive(Clone, Debug, Default)]
pub struct StaticEmbedder {
    entries: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl StaticEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { entries: HashMap::new(), dimension }
    }

    pub fn with_entry(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.insert(text, vector);
        self
    }

    pub fn insert(&mut self, text: &str, vector: Vec<f32>) {
        self.entries.insert(text.to_string(), vector);
    }
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.entries.get(text).cloned().unwrap_or_else(|| vec![0.0; self.dimension]))
    }
}

/// Embedder that always fails, for exercising the ERROR path.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableEmbedder;

#[async_trait]
impl Embedder for UnavailableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Request("embedding backend offline".to_string()))
    }
}
