//! Configuration loading, validation, and management for Skycast.
//!
//! Loads configuration from `~/.skycast/config.toml` with environment
//! variable overrides. Validates all settings at startup, before any turn
//! runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.skycast/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion and embedding service
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Document retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Live weather feed
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Durable conversation memory
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// OpenAI-compatible completion service.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL, e.g. `https://api.openai.com/v1`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_provider_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: 0.0,
            max_tokens: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Chunking at ingestion time and context assembly at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum characters in a chunk's core segment
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters of preceding text repeated at the start of each chunk
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Passages scoring below this are ignored
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Upper bound on the assembled context, in characters
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_chunk_size() -> usize {
    800
}
fn default_chunk_overlap() -> usize {
    100
}
fn default_top_k() -> usize {
    3
}
fn default_score_threshold() -> f32 {
    0.7
}
fn default_max_context_chars() -> usize {
    2000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

/// OpenWeather current-conditions endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_url")]
    pub base_url: String,

    /// Language of the condition description
    #[serde(default = "default_weather_lang")]
    pub lang: String,

    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5".into()
}
fn default_weather_lang() -> String {
    "en".into()
}
fn default_weather_timeout() -> u64 {
    15
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            lang: default_weather_lang(),
            timeout_secs: default_weather_timeout(),
        }
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("lang", &self.lang)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Durable history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// SQLite URL, e.g. `sqlite:///home/me/.skycast/skycast.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Messages loaded into each prompt
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Token budget for the loaded history
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
}

fn default_history_limit() -> usize {
    10
}
fn default_max_context_tokens() -> usize {
    4000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            history_limit: default_history_limit(),
            max_context_tokens: default_max_context_tokens(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Used when the caller supplies no session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_session_id: Option<String>,
}

/// Session used when nothing else names one.
pub const FALLBACK_SESSION_ID: &str = "local-dev";

impl SessionConfig {
    pub fn fallback_session_id(&self) -> &str {
        self.default_session_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(FALLBACK_SESSION_ID)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.skycast/config.toml),
    /// then apply environment overrides:
    /// - `SKYCAST_API_KEY`, then `OPENAI_API_KEY`
    /// - `OPENAI_BASE_URL`, `OPENAI_MODEL`
    /// - `OPENWEATHER_API_KEY`, `REQUEST_TIMEOUT_SECONDS`
    /// - `SKYCAST_DATABASE_URL`
    /// - `DEFAULT_SESSION_ID`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Environment wins over the file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("SKYCAST_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            self.provider.api_url = url;
        }
        if let Some(model) = non_empty("OPENAI_MODEL") {
            self.provider.model = model;
        }
        if let Some(key) = non_empty("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Some(timeout) = non_empty("REQUEST_TIMEOUT_SECONDS") {
            match timeout.trim().parse() {
                Ok(secs) => self.weather.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %timeout, "Ignoring non-numeric REQUEST_TIMEOUT_SECONDS"),
            }
        }
        if let Some(url) = non_empty("SKYCAST_DATABASE_URL") {
            self.memory.database_url = Some(url);
        }
        if let Some(session) = non_empty("DEFAULT_SESSION_ID") {
            self.session.default_session_id = Some(session);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".skycast")
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let r = &self.retrieval;
        if r.chunk_size == 0 {
            return Err(ConfigError::ValidationError("retrieval.chunk_size must be > 0".into()));
        }
        if r.chunk_overlap >= r.chunk_size {
            return Err(ConfigError::ValidationError(
                "retrieval.chunk_overlap must be smaller than retrieval.chunk_size".into(),
            ));
        }
        if r.top_k == 0 {
            return Err(ConfigError::ValidationError("retrieval.top_k must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&r.score_threshold) {
            return Err(ConfigError::ValidationError(
                "retrieval.score_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if r.max_context_chars == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_context_chars must be > 0".into(),
            ));
        }

        if self.memory.history_limit == 0 {
            return Err(ConfigError::ValidationError("memory.history_limit must be > 0".into()));
        }
        if self.weather.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("weather.timeout_secs must be > 0".into()));
        }

        Ok(())
    }

    /// Check that every credential and connection string a turn needs is
    /// present. Reports all missing settings at once.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if is_blank(&self.provider.api_key) {
            missing.push("OPENAI_API_KEY");
        }
        if is_blank(&self.weather.api_key) {
            missing.push("OPENWEATHER_API_KEY");
        }
        if is_blank(&self.memory.database_url) {
            missing.push("SKYCAST_DATABASE_URL");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingSettings(missing.join(", ")))
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required settings: {0}")]
    MissingSettings(String),
}
