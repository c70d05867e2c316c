//! Vector index trait and the values that pass through it.
//!
//! Chunks go in at ingestion time; scored passages come out at query time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// A contiguous span of a source document, ready to be embedded.
///
/// Chunks are immutable once indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Where the text came from (usually a file name)
    pub source: String,

    /// 0-based position of this chunk within its document
    pub chunk_id: usize,

    pub content: String,

    /// Length of `content` in characters
    pub char_len: usize,

    /// Length of the whole source document in characters
    pub total_chars: usize,
}

/// A passage returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<usize>,

    /// Similarity in `[0, 1]`, higher is more relevant
    pub score: f32,
}

/// Summary of what an index currently holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub count: usize,
    pub has_embeddings: bool,
    pub embedding_dims: Option<usize>,
}

/// The core VectorIndex trait.
///
/// Implementations: SQLite (brute-force cosine) and in-memory.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Embed and store chunks. Returns how many were stored.
    async fn add(&self, chunks: Vec<DocumentChunk>) -> std::result::Result<usize, MemoryError>;

    /// Top `k` passages for `query`, best first.
    ///
    /// The order is the index's own ranking and must be stable for a given
    /// index state.
    async fn search(&self, query: &str, k: usize) -> std::result::Result<Vec<ScoredPassage>, MemoryError>;

    /// Number of stored chunks.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;

    /// Remove every stored chunk.
    async fn clear(&self) -> std::result::Result<(), MemoryError>;

    /// Size and shape of the index.
    async fn stats(&self) -> std::result::Result<IndexStats, MemoryError> {
        let count = self.count().await?;
        Ok(IndexStats {
            count,
            has_embeddings: false,
            embedding_dims: None,
        })
    }
}
