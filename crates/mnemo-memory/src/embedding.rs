//! Embedding provider seam.
//!
//! The engine only ever sees [`EmbeddingProvider`]; [`OllamaEmbedder`] is the
//! shipped implementation, talking to a local
//! [Ollama](https://ollama.com) instance over its `/api/embeddings` endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use mnemo_memory::embedding::{EmbeddingProvider, OllamaEmbedder};
//!
//! # async fn demo() -> Result<(), mnemo_memory::MemoryError> {
//! let embedder = OllamaEmbedder::new("http://localhost:11434", "nomic-embed-text");
//! let vector = embedder.embed("the stream went great tonight").await?;
//! assert!(!vector.is_empty());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Converts text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text`.
    ///
    /// Fails with [`MemoryError::EmbeddingUnavailable`] when the provider is
    /// unreachable, rejects the input, or answers with an empty vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Cosine similarity
// ─────────────────────────────────────────────────────────────────────────────

/// Compute the cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ollama
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// [`EmbeddingProvider`] backed by Ollama's `/api/embeddings` endpoint.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create an embedder pointing at `base_url` (e.g. `"http://localhost:11434"`)
    /// using `model` (e.g. `"nomic-embed-text"`).
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    /// Send `api_key` as a bearer token (for instances behind an auth proxy).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let url = self.endpoint();
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            prompt: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MemoryError::EmbeddingUnavailable(format!("{url} unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(MemoryError::EmbeddingUnavailable(format!(
                "{url} returned HTTP {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            MemoryError::EmbeddingUnavailable(format!("unexpected response format: {e}"))
        })?;

        if body.embedding.is_empty() {
            return Err(MemoryError::EmbeddingUnavailable(
                "provider returned an empty embedding".into(),
            ));
        }
        Ok(body.embedding)
    }
}
