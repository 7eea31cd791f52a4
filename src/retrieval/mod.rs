// Retrieval module
// Composes the text encoder, corpus index, and similarity ranker into a single
// query operation for the report-assembly layer


pub mod ranker;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{AdviceDocument, CorpusIndex};
use crate::embedding::TextEncoder;
use crate::retrieval::ranker::rank_top_k;
use crate::{Result, TriageError};

/// An advice document returned from a query, with its similarity score and
/// original corpus position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAdvice {
    pub document: AdviceDocument,
    pub score: f32,
    pub corpus_index: usize,
}

/// Facade over embed-then-rank.
///
/// Holds a shared encoder handle and the corpus index built at startup; both
/// are read-only afterwards, so concurrent queries from multiple sessions are
/// safe without locking. Query results are not cached — the corpus-side
/// embeddings are the only cached state.
pub struct AdviceRetriever {
    encoder: Arc<dyn TextEncoder>,
    index: CorpusIndex,
}

impl AdviceRetriever {
    #[inline]
    pub fn new(encoder: Arc<dyn TextEncoder>, index: CorpusIndex) -> Self {
        Self { encoder, index }
    }

    /// Return the `k` corpus documents most similar to the query text.
    ///
    /// The query string is treated as opaque; how it is constructed from
    /// prediction output is the caller's policy, and its quality directly
    /// determines retrieval relevance. Synchronous and blocking; failures
    /// propagate immediately with no internal retry.
    #[inline]
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RankedAdvice>> {
        if query.trim().is_empty() {
            return Err(TriageError::InvalidArgument(
                "Query text cannot be empty".to_string(),
            ));
        }

        if k == 0 {
            return Err(TriageError::InvalidArgument(
                "k must be a positive integer".to_string(),
            ));
        }

        debug!("Retrieving top {} advice documents for query", k);

        let query_vector = self.encoder.encode(query)?;
        let matches = rank_top_k(&query_vector, &self.index, k)?;

        Ok(matches
            .into_iter()
            .filter_map(|m| {
                self.index.document(m.index).map(|document| RankedAdvice {
                    document: document.clone(),
                    score: m.score,
                    corpus_index: m.index,
                })
            })
            .collect())
    }

    #[inline]
    pub fn corpus_len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }
}
