//! The per-turn orchestration graph.
//!
//! ```text
//! classify ──rag──▶ retrieve ─────────────────▶ synthesize
//!          ──weather──▶ live_data ────────────▶ synthesize
//!          ──both──▶ retrieve ──▶ live_data ──▶ synthesize
//! ```
//!
//! Nodes run strictly one after another. After every node the turn state is
//! checkpointed together with the node that should run next, so a turn that
//! failed part way can be resumed. Checkpoints never carry anything into the
//! next turn: each turn starts from the latest user message alone and gets
//! its continuity from durable history.

pub mod checkpoint;

pub use checkpoint::{Checkpoint, Checkpointer, InMemoryCheckpointer};

use crate::classifier::IntentClassifier;
use crate::live_data::LiveDataInvoker;
use crate::memory::MemoryManager;
use crate::retrieval::RetrievalAssembler;
use crate::state::{IntentLabel, TurnState};
use crate::synthesizer::ResponseSynthesizer;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use skycast_config::{AppConfig, FALLBACK_SESSION_ID};
use skycast_core::error::{Error, Result};
use skycast_core::provider::Provider;
use skycast_core::retrieval::VectorIndex;
use skycast_core::weather::WeatherProvider;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Classify,
    Retrieve,
    LiveData,
    Synthesize,
}

impl Node {
    pub fn as_str(&self) -> &'static str {
        match self {
            Node::Classify => "classify",
            Node::Retrieve => "retrieve",
            Node::LiveData => "live_data",
            Node::Synthesize => "synthesize",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a turn goes after classification.
pub fn route(label: IntentLabel) -> Node {
    match label {
        IntentLabel::Rag | IntentLabel::Both => Node::Retrieve,
        IntentLabel::Weather => Node::LiveData,
    }
}

/// The node that follows `after`, or `None` when the turn is done.
fn next_node(after: Node, state: &TurnState) -> Option<Node> {
    match after {
        Node::Classify => Some(route(state.label.unwrap_or_default())),
        Node::Retrieve if state.label == Some(IntentLabel::Both) => Some(Node::LiveData),
        Node::Retrieve | Node::LiveData => Some(Node::Synthesize),
        Node::Synthesize => None,
    }
}

/// What the caller gets back from one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub session_id: String,
    /// The answer, or a diagnostic when the turn failed
    pub answer: String,
    pub label: Option<IntentLabel>,
    pub failed: bool,
}

pub struct ConversationGraph {
    classifier: IntentClassifier,
    retrieval: RetrievalAssembler,
    live_data: LiveDataInvoker,
    synthesizer: ResponseSynthesizer,
    checkpointer: Arc<dyn Checkpointer>,
    fallback_session: String,
}

impl ConversationGraph {
    pub fn new(
        classifier: IntentClassifier,
        retrieval: RetrievalAssembler,
        live_data: LiveDataInvoker,
        synthesizer: ResponseSynthesizer,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Self {
        Self {
            classifier,
            retrieval,
            live_data,
            synthesizer,
            checkpointer,
            fallback_session: FALLBACK_SESSION_ID.to_string(),
        }
    }

    /// Wire every node from configuration. All model calls share `provider`.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        weather: Arc<dyn WeatherProvider>,
        index: Arc<dyn VectorIndex>,
        memory: MemoryManager,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Result<Self> {
        let model = &config.provider.model;
        Ok(Self::new(
            IntentClassifier::new(provider.clone(), model),
            RetrievalAssembler::from_config(index, &config.retrieval)?,
            LiveDataInvoker::new(provider.clone(), model, weather),
            ResponseSynthesizer::from_config(provider, memory, config),
            checkpointer,
        )
        .with_fallback_session(config.session.fallback_session_id()))
    }

    /// Session used when a caller passes none (or a blank one).
    pub fn with_fallback_session(mut self, session_id: impl Into<String>) -> Self {
        self.fallback_session = session_id.into();
        self
    }

    pub fn retrieval(&self) -> &RetrievalAssembler {
        &self.retrieval
    }

    /// Run a fresh turn from the classifier to the synthesizer.
    pub async fn run(&self, state: TurnState) -> Result<TurnState> {
        self.record(&state, 0, None, Some(Node::Classify)).await?;
        self.run_from(state, Node::Classify, 0).await
    }

    /// Continue the session's interrupted turn, if there is one.
    pub async fn resume(&self, session_id: &str) -> Result<Option<TurnState>> {
        let Some(checkpoint) = self.checkpointer.latest(session_id).await? else {
            return Ok(None);
        };
        let Some(next) = checkpoint.next else {
            debug!(session = session_id, "Latest turn already completed");
            return Ok(None);
        };
        info!(session = session_id, step = checkpoint.step, next = %next, "Resuming interrupted turn");
        self.run_from(checkpoint.state, next, checkpoint.step).await.map(Some)
    }

    /// Run one turn for a user query. Never fails: errors come back as a
    /// diagnostic answer with `failed` set.
    pub async fn respond(&self, session_id: Option<&str>, query: &str) -> TurnReply {
        let session_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.fallback_session.as_str())
            .to_string();

        match self.run(TurnState::new(&session_id, query)).await {
            Ok(state) => TurnReply {
                answer: state.answer().unwrap_or_default().to_string(),
                label: state.label,
                session_id,
                failed: false,
            },
            Err(e) => {
                error!(session = %session_id, error = %e, "Turn failed");
                TurnReply {
                    answer: e.user_message(),
                    label: None,
                    session_id,
                    failed: true,
                }
            }
        }
    }

    async fn run_from(&self, mut state: TurnState, start: Node, mut step: usize) -> Result<TurnState> {
        let mut node = Some(start);
        while let Some(current) = node {
            state = self.execute(current, state).await?;
            step += 1;
            node = next_node(current, &state);
            self.record(&state, step, Some(current), node).await?;
        }
        Ok(state)
    }

    async fn execute(&self, node: Node, mut state: TurnState) -> Result<TurnState> {
        let query = state
            .latest_query()
            .ok_or_else(|| Error::Internal("turn has no user message".into()))?
            .to_string();
        debug!(session = %state.session_id, node = %node, "Entering node");

        match node {
            Node::Classify => {
                let label = self.classifier.classify(&query).await?;
                info!(session = %state.session_id, label = %label, "Query classified");
                state.label = Some(label);
            }
            Node::Retrieve => {
                let context = self.retrieval.retrieve(&query).await;
                info!(
                    session = %state.session_id,
                    passages = context.passages_used,
                    truncated = context.truncated,
                    context_len = context.text.chars().count(),
                    "Corpus context assembled"
                );
                state.context = context.text;
            }
            Node::LiveData => {
                state.context = self.live_data.invoke(&query, &state.context).await;
                info!(
                    session = %state.session_id,
                    context_len = state.context.chars().count(),
                    "Live data appended"
                );
            }
            Node::Synthesize => return self.synthesizer.synthesize(state).await,
        }
        Ok(state)
    }

    async fn record(&self, state: &TurnState, step: usize, node: Option<Node>, next: Option<Node>) -> Result<()> {
        self.checkpointer
            .put(Checkpoint {
                session_id: state.session_id.clone(),
                step,
                node,
                next,
                state: state.clone(),
                recorded_at: Utc::now(),
            })
            .await?;
        Ok(())
    }
}
