//! Storage implementations for Skycast.
//!
//! - Conversation stores (durable history and summaries)
//! - Vector indexes (semantic search over ingested documents)

pub mod embedder;
pub mod in_memory;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub mod sqlite_index;

#[cfg(test)]
mod test_support;

pub use embedder::Embedder;
pub use in_memory::{InMemoryConversationStore, InMemoryVectorIndex};
pub use vector::{cosine_similarity, relevance_score};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConversationStore, open_pool};

#[cfg(feature = "sqlite")]
pub use sqlite_index::SqliteVectorIndex;
