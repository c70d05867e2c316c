//! `skycast index-stats`: What the vector index currently holds.

use crate::bootstrap;
use skycast_core::retrieval::VectorIndex;

pub async fn stats() -> anyhow::Result<()> {
    let config = bootstrap::load_config()?;
    let services = bootstrap::build(config).await?;
    let retrieval = &services.config.retrieval;

    let stats = services.index.stats().await?;
    println!("📊 Vector Index");
    println!("====================");
    println!("  Backend:     {}", services.index.name());
    println!("  Chunks:      {}", stats.count);
    match stats.embedding_dims {
        Some(dims) => println!("  Embeddings:  {dims} dimensions ({})", services.config.provider.embedding_model),
        None => println!("  Embeddings:  (none yet)"),
    }
    println!(
        "  Chunking:    {} chars, {} overlap",
        retrieval.chunk_size, retrieval.chunk_overlap
    );
    println!(
        "  Retrieval:   top {} at score ≥ {:.2}, {} char budget",
        retrieval.top_k, retrieval.score_threshold, retrieval.max_context_chars
    );
    Ok(())
}
