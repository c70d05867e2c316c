//! Builds the long-lived service handles from configuration.
//!
//! Everything here is created once per process: one completion provider,
//! one weather client, one SQLite pool shared by the conversation store and
//! the (lazily opened) vector index.

use anyhow::Context;
use skycast_agent::{ConversationGraph, InMemoryCheckpointer, LazyVectorIndex, MemoryManager};
use skycast_config::AppConfig;
use skycast_core::provider::Provider;
use skycast_core::retrieval::VectorIndex;
use skycast_core::weather::WeatherProvider;
use skycast_memory::{Embedder, SqliteConversationStore, SqliteVectorIndex, open_pool};
use skycast_providers::OpenAiCompatProvider;
use skycast_tools::OpenWeatherClient;
use std::sync::Arc;
use tracing::debug;

pub struct Services {
    pub config: AppConfig,
    pub graph: ConversationGraph,
    pub memory: MemoryManager,
    pub index: Arc<LazyVectorIndex>,
}

/// Load configuration and fail fast on anything missing.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let config = AppConfig::load().context("Failed to load config")?;
    if let Err(e) = config.require_credentials() {
        eprintln!();
        eprintln!("  ERROR: {e}");
        eprintln!();
        eprintln!("  Set them in the environment or in:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(e.into());
    }
    Ok(config)
}

pub async fn build(config: AppConfig) -> anyhow::Result<Services> {
    let database_url = config
        .memory
        .database_url
        .clone()
        .context("SKYCAST_DATABASE_URL is not set")?;

    let provider: Arc<dyn Provider> = Arc::new(
        OpenAiCompatProvider::from_config(&config.provider).context("Failed to build completion provider")?,
    );
    let weather: Arc<dyn WeatherProvider> =
        Arc::new(OpenWeatherClient::from_config(&config.weather).context("Failed to build weather client")?);

    let pool = open_pool(&database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;
    let store = SqliteConversationStore::from_pool(pool.clone()).await?;
    let memory = MemoryManager::new(Arc::new(store));

    let embedder = Embedder::new(provider.clone(), &config.provider.embedding_model);
    let index = Arc::new(LazyVectorIndex::new(move || {
        let pool = pool.clone();
        let embedder = embedder.clone();
        async move {
            let index = SqliteVectorIndex::from_pool(pool, embedder).await?;
            Ok(Arc::new(index) as Arc<dyn VectorIndex>)
        }
    }));

    let graph = ConversationGraph::from_config(
        &config,
        provider,
        weather,
        index.clone(),
        memory.clone(),
        Arc::new(InMemoryCheckpointer::new()),
    )?;
    debug!(store = memory.store_name(), model = %config.provider.model, "Services ready");

    Ok(Services {
        config,
        graph,
        memory,
        index,
    })
}
