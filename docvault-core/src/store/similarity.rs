//! Exact cosine-similarity ranking.
//!
//! No approximate index; every candidate chunk is scored against the query
//! embedding. That is the right trade at local-document-collection scale.

use super::types::{DocumentChunk, SearchResult};
use super::{Result, StoreError};

/// Cosine similarity between two equal-length vectors.
///
/// Mismatched lengths mean the index and the query were produced by
/// different providers (or provider versions) and fail loudly. Vectors with
/// zero magnitude score 0.
pub(crate) fn cosine_similarity(query: &[f32], stored: &[f32]) -> Result<f32> {
    if query.len() != stored.len() {
        return Err(StoreError::DimensionMismatch {
            query: query.len(),
            stored: stored.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_query = 0.0f64;
    let mut norm_stored = 0.0f64;

    for (q, s) in query.iter().zip(stored) {
        let q = f64::from(*q);
        let s = f64::from(*s);
        dot += q * s;
        norm_query += q * q;
        norm_stored += s * s;
    }

    let denom = norm_query.sqrt() * norm_stored.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / denom) as f32)
}

/// Score candidates against the query embedding and return the ranked
/// survivors.
///
/// Entries below `min_similarity` (inclusive bound: `>=` passes) are
/// dropped; the rest are sorted by descending similarity with ties keeping
/// their load order, then truncated to `top_k`.
pub(crate) fn rank(
    query_embedding: &[f32],
    candidates: Vec<DocumentChunk>,
    min_similarity: f32,
    top_k: usize,
) -> Result<Vec<SearchResult>> {
    let mut results = Vec::new();

    for chunk in candidates {
        let similarity = cosine_similarity(query_embedding, &chunk.embedding)?;
        if similarity >= min_similarity {
            results.push(SearchResult { chunk, similarity });
        }
    }

    // Stable sort keeps load order on exact ties, so results are
    // deterministic.
    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);

    Ok(results)
}
