//! Per-turn execution state.
//!
//! A [`TurnState`] lives for exactly one turn. It starts with the latest user
//! message only; everything older comes from durable history.

use serde::{Deserialize, Serialize};
use skycast_core::message::{Message, Role};

/// Which knowledge source a query needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentLabel {
    /// The document corpus
    #[default]
    Rag,
    /// The live weather feed
    Weather,
    /// Corpus first, then weather
    Both,
}

impl IntentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentLabel::Rag => "rag",
            IntentLabel::Weather => "weather",
            IntentLabel::Both => "both",
        }
    }

    /// Normalize a raw model reply. Anything outside the closed set is `Rag`.
    pub fn from_reply(reply: &str) -> Self {
        match reply.trim().to_lowercase().as_str() {
            "weather" => IntentLabel::Weather,
            "both" => IntentLabel::Both,
            _ => IntentLabel::Rag,
        }
    }
}

impl std::fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient state threaded through the graph nodes of one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnState {
    pub session_id: String,

    /// The user's query, then the assistant's answer once synthesized
    pub messages: Vec<Message>,

    /// Assembled corpus passages and/or live-data summary. Never persisted.
    pub context: String,

    /// Set by the classifier
    pub label: Option<IntentLabel>,
}

impl TurnState {
    /// Fresh state holding only the latest user message.
    pub fn new(session_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: vec![Message::user(query)],
            context: String::new(),
            label: None,
        }
    }

    /// Text of the most recent user message.
    pub fn latest_query(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Text of the synthesized answer, once there is one.
    pub fn answer(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}
