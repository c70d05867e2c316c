//! Vector similarity utilities.
//!
//! Pure-Rust helpers shared by every vector index backend:
//! - Cosine similarity and its mapping onto a `[0, 1]` relevance score
//! - Top-k ranking with a stable tie order
//! - Little-endian blob encoding for stored embeddings

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Map cosine similarity onto `[0, 1]`: `(1 + cos) / 2`.
///
/// Identical directions score 1.0, orthogonal 0.5, opposite 0.0.
pub fn relevance_score(a: &[f32], b: &[f32]) -> f32 {
    ((1.0 + cosine_similarity(a, b)) / 2.0).clamp(0.0, 1.0)
}

/// Rank candidates by relevance to `query` and keep the best `k`.
///
/// Returns `(candidate index, score)` pairs, best first. Equal scores keep
/// their input order, so the ranking is stable for a given index state.
pub fn top_k<'a, I>(candidates: I, query: &[f32], k: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<(usize, f32)> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, emb)| (i, relevance_score(emb, query)))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Serialize an embedding vector to bytes.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize bytes written by [`embedding_to_blob`].
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!((relevance_score(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_half() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
        assert!((relevance_score(&a, &b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!(relevance_score(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn top_k_orders_by_score_and_truncates() {
        let stored = [vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let ranked = top_k(stored.iter().map(|v| v.as_slice()), &[1.0, 0.0], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, 1);
        assert_eq!(ranked[1].0, 2);
        assert!(ranked[0].1 >= ranked[1].1);
    }

    #[test]
    fn top_k_ties_keep_input_order() {
        let stored = [vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let ranked = top_k(stored.iter().map(|v| v.as_slice()), &[1.0, 0.0], 3);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn blob_round_trip() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&v)), v);
    }
}
