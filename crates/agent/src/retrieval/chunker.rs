//! Ingestion-time document splitting.
//!
//! Text is split hierarchically (paragraphs, lines, words, then raw
//! characters) into core segments of at most `chunk_size` characters.
//! Each chunk after the first is prefixed with the `overlap` characters of
//! source text that precede its core, so neighbours share exactly that much.
//!
//! All lengths are in characters (Unicode scalar values), never bytes.

use skycast_config::RetrievalConfig;
use skycast_core::error::{Error, Result};
use skycast_core::retrieval::DocumentChunk;
use std::ops::Range;

/// Tried in order; each separator stays attached to the piece before it.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingPolicy {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingPolicy {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk_size must be greater than 0".into(),
            });
        }
        if overlap >= chunk_size {
            return Err(Error::Config {
                message: format!("chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"),
            });
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Character ranges of every chunk, overlap included, in document order.
    pub fn segments(&self, text: &str) -> Vec<Range<usize>> {
        let mut pieces = Vec::new();
        split_pieces(text, self.chunk_size, &SEPARATORS, &mut pieces);

        let mut cores = Vec::new();
        let mut core = 0..0;
        for piece in pieces {
            let len = piece.chars().count();
            if core.len() + len > self.chunk_size && !core.is_empty() {
                let end = core.end;
                cores.push(core);
                core = end..end;
            }
            core.end += len;
        }
        if !core.is_empty() {
            cores.push(core);
        }

        cores
            .into_iter()
            .map(|core| core.start.saturating_sub(self.overlap)..core.end)
            .collect()
    }

    /// Split one document into chunks. Whitespace-only chunks are dropped.
    pub fn chunk_document(&self, source: &str, text: &str) -> Vec<DocumentChunk> {
        // Byte offset of every char boundary, plus the end of the text.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        self.segments(text)
            .into_iter()
            .map(|range| (&text[boundaries[range.start]..boundaries[range.end]], range.len()))
            .filter(|(content, _)| !content.trim().is_empty())
            .enumerate()
            .map(|(chunk_id, (content, char_len))| DocumentChunk {
                source: source.to_string(),
                chunk_id,
                content: content.to_string(),
                char_len,
                total_chars,
            })
            .collect()
    }
}

/// Break `text` into contiguous pieces of at most `limit` chars, preferring
/// the earliest separator in `separators` that applies.
fn split_pieces<'a>(text: &'a str, limit: usize, separators: &[&str], out: &mut Vec<&'a str>) {
    if text.chars().count() <= limit {
        if !text.is_empty() {
            out.push(text);
        }
        return;
    }
    match separators.split_first() {
        Some((separator, rest)) => {
            for part in text.split_inclusive(*separator) {
                split_pieces(part, limit, rest, out);
            }
        }
        None => hard_split(text, limit, out),
    }
}

fn hard_split<'a>(text: &'a str, limit: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % limit == 0 {
            out.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}
