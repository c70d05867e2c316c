//! # Skycast Core
//!
//! Domain types, traits, and error definitions for the Skycast conversational
//! engine. This crate has **no I/O dependencies**: it defines the model that
//! every other crate implements against.
//!
//! ## Seams
//!
//! Each external collaborator is a trait here, with implementations in their
//! own crates:
//! - [`Provider`]: completion and embedding service
//! - [`ConversationStore`]: durable history and summaries
//! - [`VectorIndex`]: semantic search over the document corpus
//! - [`WeatherProvider`]: live weather feed

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod weather;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result, WeatherError};
pub use memory::{ConversationStore, ConversationSummary, StoredMessage};
pub use message::{Message, Role};
pub use provider::{EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage};
pub use retrieval::{DocumentChunk, IndexStats, ScoredPassage, VectorIndex};
pub use weather::{WeatherCondition, WeatherProvider, WeatherReport};
