//! `skycast history`: Show a session's stored conversation.

use crate::bootstrap;
use crate::commands::stored_session;

pub async fn run(session: Option<String>, limit: usize) -> anyhow::Result<()> {
    let config = bootstrap::load_config()?;
    let session = stored_session(&config, session);
    let services = bootstrap::build(config).await?;

    let messages = services.memory.get_history(&session, limit).await?;
    println!("💬 History for session {session}");
    println!("====================");
    if messages.is_empty() {
        println!("  (no messages)");
        return Ok(());
    }
    for message in messages {
        println!(
            "  [{}] {}: {}",
            message.timestamp.format("%Y-%m-%d %H:%M:%S"),
            message.role,
            message.content
        );
    }
    Ok(())
}
