//! Skycast CLI: the main entry point.
//!
//! Commands:
//! - `chat`        : Interactive chat or single-message mode
//! - `ingest`      : Chunk and index documents
//! - `history`     : Show a session's stored conversation
//! - `summary`     : Add or list conversation summaries
//! - `index-stats` : Show what the vector index holds

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bootstrap;
mod commands;

#[derive(Parser)]
#[command(
    name = "skycast",
    about = "Skycast — answers from your documents and the live weather",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Session to continue (defaults to DEFAULT_SESSION_ID or a new one)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Chunk documents and add them to the vector index
    Ingest {
        /// Files or directories (.md and .txt files are read)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Clear the index before ingesting
        #[arg(long)]
        reset: bool,
    },

    /// Show stored conversation history
    History {
        #[arg(short, long)]
        session: Option<String>,

        /// Most recent messages to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Manage conversation summaries
    Summary {
        #[command(subcommand)]
        action: SummaryAction,
    },

    /// Show vector index statistics
    IndexStats,
}

#[derive(Subcommand)]
enum SummaryAction {
    /// Store a summary for a session
    Add {
        text: String,

        #[arg(short, long)]
        session: Option<String>,
    },

    /// List a session's summaries, oldest first
    List {
        #[arg(short, long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message, session } => commands::chat::run(message, session).await?,
        Commands::Ingest { paths, reset } => commands::ingest::run(paths, reset).await?,
        Commands::History { session, limit } => commands::history::run(session, limit).await?,
        Commands::Summary { action } => match action {
            SummaryAction::Add { text, session } => commands::summary::add(session, &text).await?,
            SummaryAction::List { session } => commands::summary::list(session).await?,
        },
        Commands::IndexStats => commands::index::stats().await?,
    }

    Ok(())
}
