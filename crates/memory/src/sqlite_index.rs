//! SQLite vector index.
//!
//! Stores each chunk with its embedding as a little-endian `f32` blob and
//! answers queries with a brute-force cosine scan. Fine for corpora of a few
//! thousand chunks, which is what a single-user assistant ingests.

use crate::embedder::Embedder;
use crate::sqlite::{format_timestamp, open_pool};
use crate::vector;
use async_trait::async_trait;
use chrono::Utc;
use skycast_core::error::MemoryError;
use skycast_core::retrieval::{DocumentChunk, IndexStats, ScoredPassage, VectorIndex};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// A persistent vector index backed by SQLite.
pub struct SqliteVectorIndex {
    pool: SqlitePool,
    embedder: Embedder,
}

impl SqliteVectorIndex {
    /// Open the database at `url` and create the chunk table if needed.
    pub async fn new(url: &str, embedder: Embedder) -> Result<Self, MemoryError> {
        let pool = open_pool(url).await?;
        Self::from_pool(pool, embedder).await
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool, embedder: Embedder) -> Result<Self, MemoryError> {
        let index = Self { pool, embedder };
        index.run_migrations().await?;
        Ok(index)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                source       TEXT NOT NULL,
                chunk_id     INTEGER NOT NULL,
                content      TEXT NOT NULL,
                char_len     INTEGER NOT NULL,
                total_chars  INTEGER NOT NULL,
                created_at   TEXT NOT NULL,
                embedding    BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("chunks table: {e}")))?;

        debug!("Vector index migrations complete");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn add(&self, chunks: Vec<DocumentChunk>) -> Result<usize, MemoryError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_many(texts).await?;
        let created_at = format_timestamp(Utc::now());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MemoryError::Storage(format!("BEGIN failed: {e}")))?;

        for (chunk, embedding) in chunks.iter().zip(&vectors) {
            sqlx::query(
                r#"
                INSERT INTO chunks (source, chunk_id, content, char_len, total_chars, created_at, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&chunk.source)
            .bind(chunk.chunk_id as i64)
            .bind(&chunk.content)
            .bind(chunk.char_len as i64)
            .bind(chunk.total_chars as i64)
            .bind(&created_at)
            .bind(vector::embedding_to_blob(embedding))
            .execute(&mut *tx)
            .await
            .map_err(|e| MemoryError::Storage(format!("INSERT chunk failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| MemoryError::Storage(format!("COMMIT failed: {e}")))?;

        info!(count = chunks.len(), model = %self.embedder.model(), "Indexed chunks");
        Ok(chunks.len())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>, MemoryError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query("SELECT source, chunk_id, content, embedding FROM chunks ORDER BY iid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("chunk scan: {e}")))?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_one(query).await?;

        let mut embeddings = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row
                .try_get("embedding")
                .map_err(|e| MemoryError::QueryFailed(format!("embedding column: {e}")))?;
            embeddings.push(vector::blob_to_embedding(&blob));
        }

        let ranked = vector::top_k(embeddings.iter().map(|v| v.as_slice()), &query_vec, k);

        let mut passages = Vec::with_capacity(ranked.len());
        for (i, score) in ranked {
            let row = &rows[i];
            let content: String = row
                .try_get("content")
                .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
            let source: String = row
                .try_get("source")
                .map_err(|e| MemoryError::QueryFailed(format!("source column: {e}")))?;
            let chunk_id: i64 = row
                .try_get("chunk_id")
                .map_err(|e| MemoryError::QueryFailed(format!("chunk_id column: {e}")))?;
            passages.push(ScoredPassage {
                content,
                source: Some(source),
                chunk_id: Some(chunk_id as usize),
                score,
            });
        }
        Ok(passages)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let cnt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("COUNT: {e}")))?;
        Ok(cnt as usize)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        sqlx::query("DELETE FROM chunks")
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("CLEAR failed: {e}")))?;
        info!("Vector index cleared");
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, MemoryError> {
        let count = self.count().await?;
        let dims: Option<i64> = sqlx::query_scalar("SELECT LENGTH(embedding) / 4 FROM chunks LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("embedding size: {e}")))?;
        Ok(IndexStats {
            count,
            has_embeddings: dims.is_some_and(|d| d > 0),
            embedding_dims: dims.map(|d| d as usize),
        })
    }
}
