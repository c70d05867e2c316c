//! Per-session checkpoints of the turn in progress.
//!
//! Only the latest checkpoint of each session is kept. A checkpoint whose
//! `next` is set marks an interrupted turn that can be resumed.

use super::Node;
use crate::state::TurnState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skycast_core::error::MemoryError;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,

    /// Nodes completed so far in this turn
    pub step: usize,

    /// The node that just ran; `None` before the first one
    pub node: Option<Node>,

    /// The node to run next; `None` once the turn completed
    pub next: Option<Node>,

    pub state: TurnState,

    pub recorded_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn is_pending(&self) -> bool {
        self.next.is_some()
    }
}

#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Replace the session's checkpoint.
    async fn put(&self, checkpoint: Checkpoint) -> Result<(), MemoryError>;

    /// The session's latest checkpoint, if any.
    async fn latest(&self, session_id: &str) -> Result<Option<Checkpoint>, MemoryError>;
}

/// Checkpoints held in a map for the life of the process.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn put(&self, checkpoint: Checkpoint) -> Result<(), MemoryError> {
        self.checkpoints
            .write()
            .await
            .insert(checkpoint.session_id.clone(), checkpoint);
        Ok(())
    }

    async fn latest(&self, session_id: &str) -> Result<Option<Checkpoint>, MemoryError> {
        Ok(self.checkpoints.read().await.get(session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(session: &str, step: usize, next: Option<Node>) -> Checkpoint {
        Checkpoint {
            session_id: session.into(),
            step,
            node: None,
            next,
            state: TurnState::new(session, "q"),
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn latest_replaces_previous() {
        let store = InMemoryCheckpointer::new();
        store.put(checkpoint("s1", 0, Some(Node::Classify))).await.unwrap();
        store.put(checkpoint("s1", 1, Some(Node::Retrieve))).await.unwrap();

        let latest = store.latest("s1").await.unwrap().unwrap();
        assert_eq!(latest.step, 1);
        assert_eq!(latest.next, Some(Node::Retrieve));
        assert!(latest.is_pending());
    }

    #[tokio::test]
    async fn sessions_do_not_share_checkpoints() {
        let store = InMemoryCheckpointer::new();
        store.put(checkpoint("s1", 3, None)).await.unwrap();
        assert!(store.latest("s2").await.unwrap().is_none());
        assert!(!store.latest("s1").await.unwrap().unwrap().is_pending());
    }

    #[test]
    fn checkpoint_serializes() {
        let json = serde_json::to_string(&checkpoint("s1", 0, Some(Node::LiveData))).unwrap();
        assert!(json.contains("\"next\":\"live_data\""));
    }
}
