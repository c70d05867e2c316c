//! Error types for the Skycast domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all Skycast operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Weather errors ---
    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short, operator-friendly text for an error that aborted a turn.
    ///
    /// This is what the end user sees instead of the raw error chain.
    pub fn user_message(&self) -> String {
        match self {
            Error::Provider(ProviderError::RateLimited { retry_after_secs }) => format!(
                "⚠️ The language model is rate limiting requests. Try again in {retry_after_secs}s."
            ),
            Error::Provider(ProviderError::AuthenticationFailed(_)) => {
                "❌ The language model rejected the API key. Check OPENAI_API_KEY.".into()
            }
            Error::Provider(ProviderError::Timeout(_)) => {
                "⏱️ The language model did not answer in time. Please try again.".into()
            }
            Error::Provider(e) => format!("❌ The language model request failed: {e}"),
            Error::Memory(e) => format!("❌ Conversation history is unavailable: {e}"),
            Error::Weather(e) => format!("{} {e}", e.marker()),
            Error::Config { message } => format!("❌ Configuration problem: {message}"),
            Error::Internal(e) => format!("❌ Something went wrong: {e}"),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Failures of the live weather feed.
///
/// The `Display` text of each variant is user-facing: the live-data node
/// embeds it into the turn's context instead of aborting the turn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    #[error("Weather service rejected the API key (401). Check OPENWEATHER_API_KEY.")]
    InvalidCredential,

    #[error("City not found (404): {0}")]
    UnknownLocation(String),

    #[error("Weather service rate limit exceeded (429). Please try again later.")]
    RateLimited,

    #[error("Weather request timed out. Please try again shortly.")]
    Timeout,

    #[error("Weather request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Weather request failed: {0}")]
    Network(String),

    #[error("Weather response could not be read: {0}")]
    Decode(String),
}

impl WeatherError {
    /// Leading marker used when the error is shown to the user.
    pub fn marker(&self) -> &'static str {
        match self {
            WeatherError::RateLimited => "⚠️",
            WeatherError::Timeout => "⏱️",
            _ => "❌",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        });
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn weather_error_mentions_city() {
        let err = WeatherError::UnknownLocation("Atlantis".into());
        assert_eq!(err.to_string(), "City not found (404): Atlantis");
        assert_eq!(err.marker(), "❌");
    }

    #[test]
    fn user_message_hides_error_chain() {
        let err = Error::Provider(ProviderError::RateLimited { retry_after_secs: 5 });
        let text = err.user_message();
        assert!(text.contains("rate limiting"));
        assert!(!text.contains("Provider error"));
    }

    #[test]
    fn config_error_is_user_readable() {
        let err = Error::Config {
            message: "OPENAI_API_KEY is not set".into(),
        };
        assert!(err.user_message().contains("OPENAI_API_KEY"));
    }
}
