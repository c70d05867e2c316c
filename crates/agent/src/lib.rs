//! The Skycast turn engine.
//!
//! Every user query runs through a small, conditionally routed graph:
//!
//! 1. **Classify** the query as `rag`, `weather` or `both`
//! 2. **Retrieve** ranked passages from the document index (rag, both)
//! 3. **Fetch live data** for the city the query mentions (weather, both)
//! 4. **Synthesize** an answer from history, context and question, then
//!    persist the exchange
//!
//! The graph is checkpointed after every node. Durable conversation history
//! lives behind the [`MemoryManager`].

pub mod classifier;
pub mod graph;
pub mod live_data;
pub mod memory;
pub mod retrieval;
pub mod services;
pub mod state;
pub mod synthesizer;

#[cfg(test)]
mod test_helpers;

pub use classifier::IntentClassifier;
pub use graph::{Checkpoint, Checkpointer, ConversationGraph, InMemoryCheckpointer, Node, TurnReply, route};
pub use live_data::LiveDataInvoker;
pub use memory::{ContextWindow, MemoryManager, estimate_tokens, manage_context_window};
pub use retrieval::{
    AssembledContext, AssemblyPolicy, ChunkingPolicy, NO_RELEVANT_DOCUMENTS, RetrievalAssembler, RetrievalStats,
};
pub use services::LazyVectorIndex;
pub use state::{IntentLabel, TurnState};
pub use synthesizer::ResponseSynthesizer;
