//! Response synthesis: the terminal node of every turn.
//!
//! # Flow
//!
//! 1. Load recent history for the session and trim it to the token budget
//! 2. Merge history, assembled context and the question into one prompt
//! 3. Ask the model for the answer
//! 4. Persist the user message, then the answer
//!
//! Nothing is persisted when the completion fails.

use crate::memory::{MemoryManager, manage_context_window};
use crate::state::TurnState;
use skycast_config::AppConfig;
use skycast_core::error::{Error, Result};
use skycast_core::memory::StoredMessage;
use skycast_core::message::{Message, Role};
use skycast_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "\
You are Skycast, an assistant that answers questions using the document excerpts \
and live weather data given in the [Context] section, plus the earlier conversation \
in [History]. If the context does not contain the answer, say so plainly instead of \
guessing. Always answer in the same language as the question.";

const DEFAULT_HISTORY_LIMIT: usize = 10;

const DEFAULT_MAX_CONTEXT_TOKENS: usize = 4000;

/// Render the single prompt sent to the model.
pub fn build_prompt(history: &[StoredMessage], context: &str, question: &str) -> String {
    let history = if history.is_empty() {
        "(no previous messages)".to_string()
    } else {
        history
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("[History]\n{history}\n\n[Context]\n{context}\n\n[Question]\n{question}")
}

pub struct ResponseSynthesizer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    memory: MemoryManager,
    history_limit: usize,
    max_context_tokens: usize,
}

impl ResponseSynthesizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, memory: MemoryManager) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            memory,
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, memory: MemoryManager, config: &AppConfig) -> Self {
        Self::new(provider, &config.provider.model, memory)
            .with_temperature(config.provider.temperature)
            .with_max_tokens(config.provider.max_tokens)
            .with_history_limit(config.memory.history_limit)
            .with_max_context_tokens(config.memory.max_context_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_max_context_tokens(mut self, tokens: usize) -> Self {
        self.max_context_tokens = tokens;
        self
    }

    /// Answer the turn's latest question and persist the exchange.
    pub async fn synthesize(&self, mut state: TurnState) -> Result<TurnState> {
        let question = state
            .latest_query()
            .ok_or_else(|| Error::Internal("turn has no user message".into()))?
            .to_string();
        let session = state.session_id.clone();

        let history = self.memory.get_history(&session, self.history_limit).await?;
        let window = manage_context_window(&history, self.max_context_tokens);
        if window.dropped_any() {
            warn!(session = %session, "{}", window.warning);
        }
        debug!(
            session = %session,
            history = window.messages.len(),
            history_tokens = window.used_tokens,
            context_len = state.context.chars().count(),
            "Synth: prompt assembled"
        );

        let request = ProviderRequest::new(
            &self.model,
            vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(build_prompt(&window.messages, &state.context, &question)),
            ],
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        let answer = response.message.content;
        state.messages.push(Message::assistant(answer.clone()));

        self.memory.save_message(&session, Role::User, &question).await?;
        self.memory.save_message(&session, Role::Assistant, &answer).await?;

        info!(
            session = %session,
            answer_len = answer.len(),
            tokens = response.usage.map(|u| u.total_tokens),
            "Synth: response generated"
        );
        Ok(state)
    }
}
