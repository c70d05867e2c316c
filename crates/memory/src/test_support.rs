//! Deterministic embedding provider for unit tests.

use async_trait::async_trait;
use skycast_core::error::ProviderError;
use skycast_core::message::Message;
use skycast_core::provider::*;
use std::sync::Arc;
use tokio::sync::Notify;

/// Embeds text as keyword presence over a fixed vocabulary.
pub struct KeywordEmbedder {
    pub vocabulary: Vec<&'static str>,
    /// Inputs containing this word wait for the notify before embedding.
    hold: Option<(&'static str, Arc<Notify>)>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            hold: None,
        }
    }

    pub fn holding_on(mut self, word: &'static str, release: Arc<Notify>) -> Self {
        self.hold = Some((word, release));
        self
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[async_trait]
impl Provider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            message: Message::assistant(""),
            usage: None,
            model: request.model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        if let Some((word, release)) = &self.hold {
            if request.inputs.iter().any(|t| t.contains(word)) {
                release.notified().await;
            }
        }
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| self.vector(t)).collect(),
            model: request.model,
            usage: None,
        })
    }
}
