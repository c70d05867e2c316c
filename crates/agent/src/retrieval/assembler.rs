//! Query-time context assembly.
//!
//! Passages come back from the index already ranked. Those under the score
//! threshold are dropped, the rest are labelled and concatenated in the same
//! order until the character budget is used up.

use crate::retrieval::chunker::ChunkingPolicy;
use skycast_config::RetrievalConfig;
use skycast_core::error::{MemoryError, Result};
use skycast_core::retrieval::{ScoredPassage, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Context text when no passage clears the threshold.
pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents found.";

pub const PASSAGE_DELIMITER: &str = "\n\n---\n\n";

pub const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyPolicy {
    pub top_k: usize,
    pub score_threshold: f32,
    /// Budget for the whole rendered string, labels and delimiters included
    pub max_chars: usize,
}

impl From<&RetrievalConfig> for AssemblyPolicy {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            score_threshold: config.score_threshold,
            max_chars: config.max_context_chars,
        }
    }
}

/// Aggregate numbers over the passages that cleared the threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalStats {
    pub count: usize,
    pub avg_score: f32,
    pub min_score: f32,
    pub max_score: f32,
    /// Mean passage length in characters
    pub avg_length: usize,
}

impl RetrievalStats {
    fn over(passages: &[&ScoredPassage]) -> Self {
        if passages.is_empty() {
            return Self::default();
        }
        let count = passages.len();
        let scores = passages.iter().map(|p| p.score);
        let total_len: usize = passages.iter().map(|p| p.content.chars().count()).sum();
        Self {
            count,
            avg_score: scores.clone().sum::<f32>() / count as f32,
            min_score: scores.clone().fold(f32::INFINITY, f32::min),
            max_score: scores.fold(f32::NEG_INFINITY, f32::max),
            avg_length: total_len / count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    /// Passages that made it into `text`, the truncated one included
    pub passages_used: usize,
    /// A passage was cut short and ends in the truncation marker
    pub truncated: bool,
    pub stats: RetrievalStats,
}

impl AssembledContext {
    fn empty() -> Self {
        Self {
            text: NO_RELEVANT_DOCUMENTS.to_string(),
            passages_used: 0,
            truncated: false,
            stats: RetrievalStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passages_used == 0
    }
}

/// Build the context string from ranked search results.
pub fn assemble(passages: &[ScoredPassage], policy: &AssemblyPolicy) -> AssembledContext {
    let survivors: Vec<&ScoredPassage> = passages
        .iter()
        .filter(|p| p.score >= policy.score_threshold)
        .collect();
    if survivors.is_empty() {
        return AssembledContext::empty();
    }

    let mut text = String::new();
    let mut used = 0;
    let mut passages_used = 0;
    let mut truncated = false;

    for (i, passage) in survivors.iter().enumerate() {
        let separator = if i == 0 { "" } else { PASSAGE_DELIMITER };
        let prefix = format!("{separator}[Document {}]\n", i + 1);
        let part = format!("{prefix}{}", passage.content);
        let len = part.chars().count();

        if used + len <= policy.max_chars {
            text.push_str(&part);
            used += len;
            passages_used += 1;
            continue;
        }

        // Only the passage being added is cut; earlier ones stay whole. A later
        // passage is included only if some of its content fits before the marker.
        let remaining = policy.max_chars - used;
        let marker_len = TRUNCATION_MARKER.chars().count();
        let fits_content = remaining > prefix.chars().count() + marker_len;
        if passages_used == 0 || fits_content {
            text.push_str(&truncate_with_marker(&part, remaining));
            passages_used += 1;
            truncated = true;
        }
        break;
    }

    AssembledContext {
        text,
        passages_used,
        truncated,
        stats: RetrievalStats::over(&survivors),
    }
}

/// `part` cut to exactly `max_chars` characters, ending in the marker.
fn truncate_with_marker(part: &str, max_chars: usize) -> String {
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut out: String = part.chars().take(keep).collect();
    out.extend(TRUNCATION_MARKER.chars().take(max_chars - keep));
    out
}

/// Ingests documents into a vector index and assembles query context from it.
pub struct RetrievalAssembler {
    index: Arc<dyn VectorIndex>,
    policy: AssemblyPolicy,
    chunking: ChunkingPolicy,
}

impl RetrievalAssembler {
    pub fn new(index: Arc<dyn VectorIndex>, policy: AssemblyPolicy, chunking: ChunkingPolicy) -> Self {
        Self {
            index,
            policy,
            chunking,
        }
    }

    pub fn from_config(index: Arc<dyn VectorIndex>, config: &RetrievalConfig) -> Result<Self> {
        Ok(Self::new(index, config.into(), ChunkingPolicy::from_config(config)?))
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Context for `query`. Never fails: an index error degrades to the
    /// no-documents sentinel.
    pub async fn retrieve(&self, query: &str) -> AssembledContext {
        let passages = match self.index.search(query, self.policy.top_k).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!(index = self.index.name(), error = %e, "Vector search failed, continuing without documents");
                return AssembledContext::empty();
            }
        };

        let context = assemble(&passages, &self.policy);
        debug!(
            retrieved = passages.len(),
            kept = context.stats.count,
            used = context.passages_used,
            avg_score = context.stats.avg_score,
            min_score = context.stats.min_score,
            max_score = context.stats.max_score,
            avg_length = context.stats.avg_length,
            truncated = context.truncated,
            "Assembled retrieval context"
        );
        context
    }

    /// Chunk one document and add it to the index. Returns the chunk count.
    pub async fn ingest(&self, source: &str, text: &str) -> std::result::Result<usize, MemoryError> {
        let chunks = self.chunking.chunk_document(source, text);
        if chunks.is_empty() {
            info!(source, "Nothing to ingest");
            return Ok(0);
        }
        let avg_size = chunks.iter().map(|c| c.char_len).sum::<usize>() / chunks.len();
        let stored = self.index.add(chunks).await?;
        info!(source, chunks = stored, avg_size, "Ingested document");
        Ok(stored)
    }

    /// Drop everything from the index.
    pub async fn reset(&self) -> std::result::Result<(), MemoryError> {
        self.index.clear().await?;
        info!(index = self.index.name(), "Cleared vector index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{CannedIndex, passage};

    fn policy(max_chars: usize) -> AssemblyPolicy {
        AssemblyPolicy {
            top_k: 3,
            score_threshold: 0.7,
            max_chars,
        }
    }

    #[test]
    fn nothing_above_threshold_gives_sentinel() {
        let ctx = assemble(&[passage("low", 0.69), passage("lower", 0.2)], &policy(2000));
        assert_eq!(ctx.text, NO_RELEVANT_DOCUMENTS);
        assert!(ctx.is_empty());
        assert!(!ctx.truncated);
    }

    #[test]
    fn survivors_keep_index_order_with_labels() {
        let passages = [passage("first", 0.8), passage("noise", 0.1), passage("second", 0.95)];
        let ctx = assemble(&passages, &policy(2000));
        assert_eq!(ctx.text, "[Document 1]\nfirst\n\n---\n\n[Document 2]\nsecond");
        assert_eq!(ctx.passages_used, 2);
        assert_eq!(ctx.stats.count, 2);
        assert!((ctx.stats.max_score - 0.95).abs() < 1e-6);
        assert!((ctx.stats.min_score - 0.8).abs() < 1e-6);
        assert_eq!(ctx.stats.avg_length, 5);
    }

    #[test]
    fn threshold_is_inclusive() {
        let ctx = assemble(&[passage("edge", 0.7)], &policy(2000));
        assert_eq!(ctx.passages_used, 1);
    }

    #[test]
    fn truncation_hits_budget_exactly() {
        let passages = [passage(&"x".repeat(50), 0.9), passage(&"ğ".repeat(50), 0.9)];
        for max in [3, 10, 40, 100, 120] {
            let ctx = assemble(&passages, &policy(max));
            assert!(ctx.truncated, "max {max}");
            assert_eq!(ctx.text.chars().count(), max, "max {max}");
            assert!(ctx.text.ends_with(TRUNCATION_MARKER));
        }
    }

    #[test]
    fn exact_fit_is_not_truncated() {
        let p = passage("abc", 0.9);
        let rendered = "[Document 1]\nabc";
        let ctx = assemble(&[p], &policy(rendered.chars().count()));
        assert_eq!(ctx.text, rendered);
        assert!(!ctx.truncated);
    }

    #[test]
    fn exact_fill_leaves_earlier_passage_intact() {
        let passages = [passage("abcdefghij", 0.9), passage("more", 0.9)];
        let first = "[Document 1]\nabcdefghij";
        let ctx = assemble(&passages, &policy(first.chars().count()));
        assert_eq!(ctx.text, first);
        assert_eq!(ctx.passages_used, 1);
        assert!(!ctx.truncated);
    }

    #[test]
    fn remainder_smaller_than_label_drops_next_passage() {
        let passages = [passage("abcdefghij", 0.9), passage("more", 0.9)];
        let first = "[Document 1]\nabcdefghij";
        let ctx = assemble(&passages, &policy(first.chars().count() + 5));
        assert_eq!(ctx.text, first);
        assert_eq!(ctx.passages_used, 1);
        assert!(!ctx.truncated);
    }

    #[test]
    fn only_the_last_passage_is_cut() {
        let passages = [passage("abcdefghij", 0.9), passage("more", 0.9)];
        let expected = "[Document 1]\nabcdefghij\n\n---\n\n[Document 2]\nmo...";
        let ctx = assemble(&passages, &policy(expected.chars().count()));
        assert_eq!(ctx.text, expected);
        assert_eq!(ctx.passages_used, 2);
        assert!(ctx.truncated);
    }

    #[test]
    fn never_exceeds_budget() {
        let passages: Vec<_> = (0..5).map(|i| passage(&"ş".repeat(i * 40 + 1), 0.9)).collect();
        for max in (0..600).step_by(7) {
            let ctx = assemble(&passages, &policy(max));
            assert!(ctx.text.chars().count() <= max);
        }
    }

    #[tokio::test]
    async fn index_failure_degrades_to_sentinel() {
        let assembler = RetrievalAssembler::new(
            Arc::new(CannedIndex::failing("disk on fire")),
            policy(2000),
            ChunkingPolicy::new(800, 100).unwrap(),
        );
        let ctx = assembler.retrieve("anything").await;
        assert_eq!(ctx.text, NO_RELEVANT_DOCUMENTS);
    }

    #[tokio::test]
    async fn ingest_chunks_into_index() {
        let index = Arc::new(CannedIndex::empty());
        let assembler = RetrievalAssembler::new(
            index.clone(),
            policy(2000),
            ChunkingPolicy::new(20, 5).unwrap(),
        );
        let stored = assembler
            .ingest("notes.md", "one two three four five six seven eight nine ten")
            .await
            .unwrap();
        assert!(stored > 1);
        assert_eq!(index.count().await.unwrap(), stored);

        assembler.reset().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
