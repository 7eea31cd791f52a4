#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use crate::corpus::CorpusIndex;
use crate::{Result, TriageError};

/// A corpus position paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    /// Position of the document in corpus order
    pub index: usize,
    /// Cosine similarity in [-1, 1]; the floor value marks a degenerate
    /// (zero-norm) embedding ranked below every defined score
    pub score: f32,
}

const DEGENERATE_SCORE: f32 = -1.0;

/// Cosine similarity of two vectors, or `None` when either norm is zero.
///
/// Zero-norm embeddings make the quotient undefined; callers rank them last
/// instead of dividing.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        None
    } else {
        Some(dot / (norm_a * norm_b))
    }
}

/// Score every corpus row against the query vector and keep the top `k`.
///
/// Results are ordered by descending similarity with ties broken by ascending
/// corpus index, so repeated calls over an unchanged corpus are deterministic.
/// Exactly `min(k, corpus len)` matches are returned. The scan is exhaustive,
/// O(documents × dimension); at tens to low hundreds of documents an
/// approximate index would buy nothing.
#[inline]
pub fn rank_top_k(query: &[f32], index: &CorpusIndex, k: usize) -> Result<Vec<RankedMatch>> {
    if k == 0 {
        return Err(TriageError::InvalidArgument(
            "k must be a positive integer".to_string(),
        ));
    }

    if query.len() != index.dimension() {
        return Err(TriageError::InvalidArgument(format!(
            "Query vector has dimension {} but the corpus index has {}",
            query.len(),
            index.dimension()
        )));
    }

    let mut scored: Vec<(usize, Option<f32>)> = index
        .embeddings()
        .iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query, row)))
        .collect();

    scored.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(scored
        .into_iter()
        .take(k.min(index.len()))
        .map(|(i, score)| RankedMatch {
            index: i,
            score: score.unwrap_or(DEGENERATE_SCORE),
        })
        .collect())
}
