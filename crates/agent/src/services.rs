//! Process-wide service handles.
//!
//! Opening the vector index means touching the database and building an
//! embedder, which a weather-only session never needs. [`LazyVectorIndex`]
//! defers that to the first call and then reuses the same handle.

use async_trait::async_trait;
use futures::future::BoxFuture;
use skycast_core::error::MemoryError;
use skycast_core::retrieval::{DocumentChunk, IndexStats, ScoredPassage, VectorIndex};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

type IndexFactory = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn VectorIndex>, MemoryError>> + Send + Sync>;

/// A [`VectorIndex`] opened on first use.
///
/// A failed open is not cached; the next call tries again.
pub struct LazyVectorIndex {
    cell: OnceCell<Arc<dyn VectorIndex>>,
    factory: IndexFactory,
}

impl LazyVectorIndex {
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn VectorIndex>, MemoryError>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(move || Box::pin(factory())),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn get(&self) -> Result<&Arc<dyn VectorIndex>, MemoryError> {
        self.cell
            .get_or_try_init(|| async {
                let index = (self.factory)().await?;
                debug!(index = index.name(), "Vector index opened");
                Ok(index)
            })
            .await
    }
}

#[async_trait]
impl VectorIndex for LazyVectorIndex {
    fn name(&self) -> &str {
        self.cell.get().map_or("lazy", |index| index.name())
    }

    async fn add(&self, chunks: Vec<DocumentChunk>) -> Result<usize, MemoryError> {
        self.get().await?.add(chunks).await
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>, MemoryError> {
        self.get().await?.search(query, k).await
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        self.get().await?.count().await
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.get().await?.clear().await
    }

    async fn stats(&self) -> Result<IndexStats, MemoryError> {
        self.get().await?.stats().await
    }
}
