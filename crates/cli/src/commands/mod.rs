pub mod chat;
pub mod history;
pub mod index;
pub mod ingest;
pub mod summary;

use skycast_config::AppConfig;

/// Session for commands that inspect stored data.
pub(crate) fn stored_session(config: &AppConfig, session: Option<String>) -> String {
    session
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.session.fallback_session_id().to_string())
}
