//! SQLite conversation store.
//!
//! One database file holds two append-only tables:
//! - `messages`: the short-term conversation log
//! - `summaries`: long-term compressed history
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`),
//! so lexical order is chronological order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use skycast_core::error::MemoryError;
use skycast_core::memory::{ConversationStore, ConversationSummary, StoredMessage};
use skycast_core::message::Role;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Open (and create if missing) a SQLite database.
///
/// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
pub async fn open_pool(url: &str) -> Result<SqlitePool, MemoryError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| MemoryError::Storage(format!("Invalid SQLite URL: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

    info!("SQLite database opened at {url}");
    Ok(pool)
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, MemoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MemoryError::QueryFailed(format!("bad timestamp {raw:?}: {e}")))
}

/// A durable conversation store backed by SQLite.
pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    /// Open the database at `url` and create the tables if needed.
    pub async fn new(url: &str) -> Result<Self, MemoryError> {
        let pool = open_pool(url).await?;
        Self::from_pool(pool).await
    }

    /// Create from an existing pool (lets the vector index share the file).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session_ts ON messages(session_id, timestamp, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("messages index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summaries (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL,
                summary     TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("summaries table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_summaries_session_ts ON summaries(session_id, timestamp, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("summaries index: {e}")))?;

        debug!("Conversation store migrations complete");
        Ok(())
    }

    /// Parse a `StoredMessage` from a SQLite row.
    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<StoredMessage, MemoryError> {
        let iid: i64 = row
            .try_get("iid")
            .map_err(|e| MemoryError::QueryFailed(format!("iid column: {e}")))?;
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| MemoryError::QueryFailed(format!("session_id column: {e}")))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| MemoryError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let timestamp: String = row
            .try_get("timestamp")
            .map_err(|e| MemoryError::QueryFailed(format!("timestamp column: {e}")))?;

        Ok(StoredMessage {
            id: iid.to_string(),
            session_id,
            role: Role::from_str(&role).map_err(MemoryError::QueryFailed)?,
            content,
            timestamp: parse_timestamp(&timestamp)?,
        })
    }

    fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationSummary, MemoryError> {
        let iid: i64 = row
            .try_get("iid")
            .map_err(|e| MemoryError::QueryFailed(format!("iid column: {e}")))?;
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| MemoryError::QueryFailed(format!("session_id column: {e}")))?;
        let summary: String = row
            .try_get("summary")
            .map_err(|e| MemoryError::QueryFailed(format!("summary column: {e}")))?;
        let timestamp: String = row
            .try_get("timestamp")
            .map_err(|e| MemoryError::QueryFailed(format!("timestamp column: {e}")))?;

        Ok(ConversationSummary {
            id: iid.to_string(),
            session_id,
            summary,
            timestamp: parse_timestamp(&timestamp)?,
        })
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append_message(&self, session_id: &str, role: Role, content: &str) -> Result<String, MemoryError> {
        let last: Option<String> =
            sqlx::query_scalar("SELECT MAX(timestamp) FROM messages WHERE session_id = ?1")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MemoryError::QueryFailed(format!("last timestamp: {e}")))?;

        let now = Utc::now();
        let timestamp = match last.as_deref().map(parse_timestamp).transpose()? {
            Some(prev) if prev > now => prev,
            _ => now,
        };

        let result = sqlx::query(
            "INSERT INTO messages (session_id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(format_timestamp(timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT message failed: {e}")))?;

        let id = result.last_insert_rowid().to_string();
        debug!(session = %session_id, %role, id = %id, "Stored message");
        Ok(id)
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<StoredMessage>, MemoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE session_id = ?1 ORDER BY timestamp ASC, iid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("list messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn append_summary(&self, session_id: &str, summary: &str) -> Result<String, MemoryError> {
        let result = sqlx::query(
            "INSERT INTO summaries (session_id, summary, timestamp) VALUES (?1, ?2, ?3)",
        )
        .bind(session_id)
        .bind(summary)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT summary failed: {e}")))?;

        Ok(result.last_insert_rowid().to_string())
    }

    async fn list_summaries(&self, session_id: &str) -> Result<Vec<ConversationSummary>, MemoryError> {
        let rows = sqlx::query(
            "SELECT * FROM summaries WHERE session_id = ?1 ORDER BY timestamp ASC, iid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("list summaries: {e}")))?;

        rows.iter().map(Self::row_to_summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteConversationStore {
        SqliteConversationStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn append_and_list_in_order() {
        let store = test_store().await;
        let first = store.append_message("s1", Role::User, "Merhaba").await.unwrap();
        let second = store.append_message("s1", Role::Assistant, "Selam!").await.unwrap();
        assert_ne!(first, second);

        let messages = store.list_messages("s1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Merhaba");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[0].id, first);
    }

    #[tokio::test]
    async fn timestamps_never_go_backwards() {
        let store = test_store().await;
        for i in 0..20 {
            store.append_message("s", Role::User, &format!("m{i}")).await.unwrap();
        }
        let messages = store.list_messages("s").await.unwrap();
        assert_eq!(messages.len(), 20);
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents.first(), Some(&"m0"));
        assert_eq!(contents.last(), Some(&"m19"));
    }

    #[tokio::test]
    async fn future_timestamp_is_respected() {
        let store = test_store().await;
        let future = Utc::now() + chrono::Duration::hours(1);
        sqlx::query("INSERT INTO messages (session_id, role, content, timestamp) VALUES ('s', 'user', 'skewed', ?1)")
            .bind(format_timestamp(future))
            .execute(&store.pool)
            .await
            .unwrap();

        store.append_message("s", Role::Assistant, "after").await.unwrap();
        let messages = store.list_messages("s").await.unwrap();
        assert_eq!(messages[1].content, "after");
        assert!(messages[1].timestamp >= messages[0].timestamp);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = test_store().await;
        store.append_message("a", Role::User, "for a").await.unwrap();
        store.append_message("b", Role::User, "for b").await.unwrap();
        let a = store.list_messages("a").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].session_id, "a");
        assert!(store.list_messages("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn summaries_are_separate_from_messages() {
        let store = test_store().await;
        store.append_message("s", Role::User, "hi").await.unwrap();
        store.append_summary("s", "User greeted the assistant.").await.unwrap();
        store.append_summary("s", "Then asked about Ankara.").await.unwrap();

        let summaries = store.list_summaries("s").await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].summary, "Then asked about Ankara.");
        assert_eq!(store.list_messages("s").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("skycast.db").display());
        {
            let store = SqliteConversationStore::new(&url).await.unwrap();
            store.append_message("s", Role::User, "remember me").await.unwrap();
        }
        let reopened = SqliteConversationStore::new(&url).await.unwrap();
        let messages = reopened.list_messages("s").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "remember me");
    }

    #[test]
    fn timestamp_format_is_fixed_width() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(format_timestamp(ts), "2024-05-01T10:00:00.000000Z");
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }
}
