//! Intent classification.
//!
//! One deterministic LLM call per turn decides which knowledge source the
//! query needs. The reply is normalized into the closed [`IntentLabel`] set.

use crate::state::IntentLabel;
use skycast_core::error::ProviderError;
use skycast_core::message::Message;
use skycast_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

const INSTRUCTION: &str = "\
Classify the user's question into exactly one category and reply with that single word only.
- weather: the question asks about current weather, temperature, rain, wind or similar conditions in a place.
- rag: the question should be answered from the document collection.
- both: the question needs the documents and the current weather together.
Reply with one of: rag, weather, both.";

/// The label word is all we want back.
const MAX_LABEL_TOKENS: u32 = 5;

pub struct IntentClassifier {
    provider: Arc<dyn Provider>,
    model: String,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Label a query. Provider failures propagate; odd replies become `Rag`.
    pub async fn classify(&self, query: &str) -> Result<IntentLabel, ProviderError> {
        let request = ProviderRequest::new(
            &self.model,
            vec![Message::system(INSTRUCTION), Message::user(query)],
        )
        .with_temperature(0.0)
        .with_max_tokens(Some(MAX_LABEL_TOKENS));

        let response = self.provider.complete(request).await?;
        let label = IntentLabel::from_reply(&response.message.content);
        debug!(reply = %response.message.content.trim(), label = %label, "Classified query");
        Ok(label)
    }
}
