//! Conversation store trait: the durable, append-only layer of memory.
//!
//! Two independent logs live behind one store, both partitioned by session:
//! - short-term messages (what was said, in order)
//! - long-term summaries (compressed history written out of band)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;
use crate::message::Role;

/// One durable conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Storage identifier assigned by the store
    pub id: String,

    pub session_id: String,

    pub role: Role,

    pub content: String,

    /// Never earlier than any previous message of the same session
    pub timestamp: DateTime<Utc>,
}

/// One durable summary of older conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,

    pub session_id: String,

    pub summary: String,

    pub timestamp: DateTime<Utc>,
}

/// The core ConversationStore trait.
///
/// Implementations: SQLite and in-memory (for testing).
///
/// Writes are single-record and atomic. Messages are never updated or
/// deleted in normal operation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Append one message and return its storage identifier.
    ///
    /// The stored timestamp is clamped so it never goes backwards within a
    /// session, even if the wall clock does.
    async fn append_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> std::result::Result<String, MemoryError>;

    /// All messages of a session, oldest first (insertion order breaks ties).
    async fn list_messages(&self, session_id: &str) -> std::result::Result<Vec<StoredMessage>, MemoryError>;

    /// Append one summary and return its storage identifier.
    async fn append_summary(&self, session_id: &str, summary: &str) -> std::result::Result<String, MemoryError>;

    /// All summaries of a session, oldest first.
    async fn list_summaries(
        &self,
        session_id: &str,
    ) -> std::result::Result<Vec<ConversationSummary>, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_message_serialization() {
        let msg = StoredMessage {
            id: "42".into(),
            session_id: "local-dev".into(),
            role: Role::User,
            content: "Is it raining in Izmir?".into(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("Izmir"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
