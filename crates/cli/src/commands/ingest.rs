//! `skycast ingest`: Chunk documents into the vector index.

use crate::bootstrap;
use anyhow::Context;
use skycast_core::retrieval::VectorIndex;
use std::path::{Path, PathBuf};
use tracing::warn;

const EXTENSIONS: [&str; 3] = ["md", "txt", "markdown"];

pub async fn run(paths: Vec<PathBuf>, reset: bool) -> anyhow::Result<()> {
    let config = bootstrap::load_config()?;
    let services = bootstrap::build(config).await?;
    let retrieval = services.graph.retrieval();

    if reset {
        retrieval.reset().await.context("Failed to clear the index")?;
        println!("🗑️  Index cleared");
    }

    let mut files = Vec::new();
    for path in &paths {
        collect_documents(path, &mut files)?;
    }
    if files.is_empty() {
        println!("No .md or .txt documents found.");
        return Ok(());
    }

    println!("📚 Ingesting {} document(s)", files.len());
    let mut total = 0;
    for file in &files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %file.display(), error = %e, "Skipping unreadable file");
                continue;
            }
        };
        let source = file.display().to_string();
        let chunks = retrieval
            .ingest(&source, &text)
            .await
            .with_context(|| format!("Failed to ingest {source}"))?;
        println!("  {source}: {chunks} chunk(s)");
        total += chunks;
    }

    let count = services.index.count().await?;
    println!();
    println!("✅ Added {total} chunk(s); index now holds {count}");
    Ok(())
}

/// Add `path` (or the documents directly inside it) to `out`, sorted by name.
fn collect_documents(path: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    if path.is_file() {
        out.push(path.to_path_buf());
        return Ok(());
    }
    let entries = std::fs::read_dir(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_document(p))
        .collect();
    found.sort();
    out.extend(found);
    Ok(())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_yields_only_documents_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("b.md"), "b").unwrap();
        std::fs::write(dir.join("a.TXT"), "a").unwrap();
        std::fs::write(dir.join("image.png"), "x").unwrap();

        let mut files = Vec::new();
        collect_documents(dir, &mut files).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.TXT", "b.md"]);
    }

    #[test]
    fn explicit_file_is_taken_as_is() {
        let mut files = Vec::new();
        collect_documents(Path::new("Cargo.toml"), &mut files).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let mut files = Vec::new();
        assert!(collect_documents(Path::new("/definitely/not/here"), &mut files).is_err());
    }
}
