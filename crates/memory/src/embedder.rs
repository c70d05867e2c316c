//! Embedding helper shared by the vector index backends.

use skycast_core::error::MemoryError;
use skycast_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use tracing::debug;

/// Inputs per embedding request.
const BATCH_SIZE: usize = 64;

/// Turns text into vectors through a [`Provider`].
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        self.embed_many(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::EmbeddingFailed("provider returned no vectors".into()))
    }

    /// Embed many texts, one vector per input in input order.
    pub async fn embed_many(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, MemoryError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            let response = self
                .provider
                .embed(EmbeddingRequest {
                    model: self.model.clone(),
                    inputs: batch.to_vec(),
                })
                .await
                .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;

            if response.embeddings.len() != batch.len() {
                return Err(MemoryError::EmbeddingFailed(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            debug!(model = %self.model, count = batch.len(), "Embedded batch");
            vectors.extend(response.embeddings);
        }
        Ok(vectors)
    }
}
