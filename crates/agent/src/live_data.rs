//! Live weather lookup for the turn.
//!
//! The city is pulled out of the query by the model, with a locative regex
//! and finally the raw query as fallbacks. Provider failures never abort the
//! turn: the diagnostic becomes context text like a normal report would.

use regex_lite::Regex;
use skycast_core::message::Message;
use skycast_core::provider::{Provider, ProviderRequest};
use skycast_core::weather::WeatherProvider;
use skycast_tools::{render_error, render_report};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

const EXTRACTION_INSTRUCTION: &str = "\
Extract the city name the user is asking about. Reply with the city name only, \
as a single word in its usual spelling, with no punctuation or explanation.";

const MAX_CITY_TOKENS: u32 = 10;

/// Capitalized words followed by a locative marker, tried in order:
/// Turkish case suffix (`Ankara'da`), English preposition (`in Paris`),
/// then a word right before "hava"/"weather". The suffix list is closed so
/// English contractions ("What's", "It'll") never match.
const LOCATIVE_PATTERNS: [&str; 3] = [
    r"([A-ZÇĞİÖŞÜ][a-zçğıöşü]+)['’](?:dan|den|tan|ten|nın|nin|nun|nün|da|de|ta|te|ın|in|un|ün|ya|ye|a|e)(?:ki)?(?:[^a-zçğıöşü]|$)",
    r"(?:^|\s)(?:in|for|at|of)\s+([A-ZÇĞİÖŞÜ][a-zçğıöşü]+)",
    r"([A-ZÇĞİÖŞÜ][a-zçğıöşü]+)\s+(?:hava|weather)",
];

static LOCATIVES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| LOCATIVE_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect());

/// First capitalized word in a locative position, if any.
pub fn locative_fallback(query: &str) -> Option<String> {
    LOCATIVES
        .iter()
        .find_map(|re| re.captures(query))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Append `addition` to `existing` with a blank line between them.
pub fn append_context(existing: &str, addition: &str) -> String {
    if existing.is_empty() {
        addition.to_string()
    } else {
        format!("{existing}\n\n{addition}")
    }
}

/// First line of a model reply with quotes and trailing punctuation removed.
fn clean_city_reply(reply: &str) -> Option<String> {
    let line = reply.lines().next()?.trim();
    let city = line
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.' | '“' | '”'))
        .trim();
    (!city.is_empty()).then(|| city.to_string())
}

pub struct LiveDataInvoker {
    provider: Arc<dyn Provider>,
    model: String,
    weather: Arc<dyn WeatherProvider>,
}

impl LiveDataInvoker {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            model: model.into(),
            weather,
        }
    }

    /// City name for `query`. Always returns something.
    pub async fn extract_location(&self, query: &str) -> String {
        let request = ProviderRequest::new(
            &self.model,
            vec![Message::system(EXTRACTION_INSTRUCTION), Message::user(query)],
        )
        .with_temperature(0.0)
        .with_max_tokens(Some(MAX_CITY_TOKENS));

        match self.provider.complete(request).await {
            Ok(response) => {
                if let Some(city) = clean_city_reply(&response.message.content) {
                    debug!(city = %city, "Location extracted by model");
                    return city;
                }
                debug!("Model returned no location, trying patterns");
            }
            Err(e) => warn!(error = %e, "Location extraction failed, trying patterns"),
        }

        match locative_fallback(query) {
            Some(city) => {
                debug!(city = %city, "Location matched by pattern");
                city
            }
            None => query.trim().to_string(),
        }
    }

    /// Fetch current weather for the query's city and append the rendered
    /// summary (or the diagnostic) to `existing`.
    pub async fn invoke(&self, query: &str, existing: &str) -> String {
        let city = self.extract_location(query).await;
        let summary = match self.weather.current(&city).await {
            Ok(report) => {
                info!(city = %city, condition = ?report.condition(), "Weather fetched");
                render_report(&report)
            }
            Err(e) => {
                warn!(city = %city, provider = self.weather.name(), error = %e, "Weather lookup failed");
                render_error(&e)
            }
        };
        append_context(existing, &summary)
    }
}
