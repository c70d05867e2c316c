//! `skycast summary`: Long-range conversation summaries.

use crate::bootstrap;
use crate::commands::stored_session;

pub async fn add(session: Option<String>, text: &str) -> anyhow::Result<()> {
    let config = bootstrap::load_config()?;
    let session = stored_session(&config, session);
    let services = bootstrap::build(config).await?;

    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("summary text is empty");
    }
    let id = services.memory.save_summary(&session, text).await?;
    println!("📝 Saved summary {id} for session {session}");
    Ok(())
}

pub async fn list(session: Option<String>) -> anyhow::Result<()> {
    let config = bootstrap::load_config()?;
    let session = stored_session(&config, session);
    let services = bootstrap::build(config).await?;

    let summaries = services.memory.get_summaries(&session).await?;
    println!("📝 Summaries for session {session}");
    println!("====================");
    if summaries.is_empty() {
        println!("  (none)");
    }
    for summary in summaries {
        println!("  [{}] {}", summary.timestamp.format("%Y-%m-%d %H:%M:%S"), summary.summary);
    }
    Ok(())
}
