//! In-memory backends: useful for testing and ephemeral sessions.

use crate::embedder::Embedder;
use crate::vector;
use async_trait::async_trait;
use chrono::Utc;
use skycast_core::error::MemoryError;
use skycast_core::memory::{ConversationStore, ConversationSummary, StoredMessage};
use skycast_core::message::Role;
use skycast_core::retrieval::{DocumentChunk, IndexStats, ScoredPassage, VectorIndex};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct ConversationLog {
    messages: Vec<StoredMessage>,
    summaries: Vec<ConversationSummary>,
    next_id: u64,
}

impl ConversationLog {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

/// A conversation store that keeps everything in a Vec.
/// Nothing survives the process.
#[derive(Default)]
pub struct InMemoryConversationStore {
    log: Arc<RwLock<ConversationLog>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append_message(&self, session_id: &str, role: Role, content: &str) -> Result<String, MemoryError> {
        let mut log = self.log.write().await;
        let last = log
            .messages
            .iter()
            .rev()
            .find(|m| m.session_id == session_id)
            .map(|m| m.timestamp);
        let now = Utc::now();
        let timestamp = last.map_or(now, |prev| prev.max(now));

        let id = log.next_id();
        log.messages.push(StoredMessage {
            id: id.clone(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            timestamp,
        });
        Ok(id)
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<StoredMessage>, MemoryError> {
        let log = self.log.read().await;
        // Insertion order is already chronological within a session.
        Ok(log
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn append_summary(&self, session_id: &str, summary: &str) -> Result<String, MemoryError> {
        let mut log = self.log.write().await;
        let id = log.next_id();
        log.summaries.push(ConversationSummary {
            id: id.clone(),
            session_id: session_id.to_string(),
            summary: summary.to_string(),
            timestamp: Utc::now(),
        });
        Ok(id)
    }

    async fn list_summaries(&self, session_id: &str) -> Result<Vec<ConversationSummary>, MemoryError> {
        let log = self.log.read().await;
        Ok(log
            .summaries
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect())
    }
}

/// A brute-force vector index held in memory.
pub struct InMemoryVectorIndex {
    embedder: Embedder,
    entries: Arc<RwLock<Vec<(DocumentChunk, Vec<f32>)>>>,
}

impl InMemoryVectorIndex {
    pub fn new(embedder: Embedder) -> Self {
        Self {
            embedder,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn add(&self, chunks: Vec<DocumentChunk>) -> Result<usize, MemoryError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_many(texts).await?;
        let added = chunks.len();
        self.entries.write().await.extend(chunks.into_iter().zip(vectors));
        Ok(added)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>, MemoryError> {
        if k == 0 || self.entries.read().await.is_empty() {
            return Ok(Vec::new());
        }
        // No lock is held across the provider call.
        let query_vec = self.embedder.embed_one(query).await?;

        let entries = self.entries.read().await;
        let ranked = vector::top_k(entries.iter().map(|(_, v)| v.as_slice()), &query_vec, k);
        Ok(ranked
            .into_iter()
            .map(|(i, score)| {
                let chunk = &entries[i].0;
                ScoredPassage {
                    content: chunk.content.clone(),
                    source: Some(chunk.source.clone()),
                    chunk_id: Some(chunk.chunk_id),
                    score,
                }
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, MemoryError> {
        let entries = self.entries.read().await;
        let dims = entries.first().map(|(_, v)| v.len());
        Ok(IndexStats {
            count: entries.len(),
            has_embeddings: dims.is_some(),
            embedding_dims: dims,
        })
    }
}
