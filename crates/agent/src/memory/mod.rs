//! Durable conversational memory for the orchestration graph.
//!
//! The [`MemoryManager`] is the only component that reads or writes the
//! conversation store. Trimming history to a token budget is a pure policy
//! in [`window`] and never touches storage.

pub mod token;
pub mod window;

pub use token::estimate_tokens;
pub use window::{ContextWindow, manage_context_window};

use skycast_core::error::MemoryError;
use skycast_core::memory::{ConversationStore, ConversationSummary, StoredMessage};
use skycast_core::message::Role;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct MemoryManager {
    store: Arc<dyn ConversationStore>,
}

impl MemoryManager {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Append one message to the session's history.
    pub async fn save_message(&self, session_id: &str, role: Role, content: &str) -> Result<String, MemoryError> {
        let id = self.store.append_message(session_id, role, content).await?;
        debug!(session = session_id, role = %role, id = %id, "Saved message");
        Ok(id)
    }

    /// The `limit` most recent messages of a session, oldest first.
    pub async fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<StoredMessage>, MemoryError> {
        let mut messages = self.store.list_messages(session_id).await?;
        // Stable, so insertion order breaks timestamp ties.
        messages.sort_by_key(|m| m.timestamp);
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    pub async fn save_summary(&self, session_id: &str, summary: &str) -> Result<String, MemoryError> {
        let id = self.store.append_summary(session_id, summary).await?;
        debug!(session = session_id, id = %id, "Saved summary");
        Ok(id)
    }

    /// All summaries of a session, oldest first.
    pub async fn get_summaries(&self, session_id: &str) -> Result<Vec<ConversationSummary>, MemoryError> {
        let mut summaries = self.store.list_summaries(session_id).await?;
        summaries.sort_by_key(|s| s.timestamp);
        Ok(summaries)
    }
}
