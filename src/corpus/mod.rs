// Corpus module
// Loads the fixed advice corpus and materializes its embedding matrix


use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::embedding::TextEncoder;
use crate::{Result, TriageError};

/// A single advice passage with its citation.
///
/// Documents are identified by their position in corpus order and are
/// immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdviceDocument {
    /// The advice content
    pub advice: String,
    /// Citation label (book, guideline, page reference)
    #[serde(default)]
    pub source: String,
    /// Page reference, if available
    #[serde(default)]
    pub page_number: Option<u32>,
}

/// The advice documents plus their precomputed embedding matrix, row i being
/// the embedding of document i. Built once at startup and read-only afterwards.
#[derive(Debug)]
pub struct CorpusIndex {
    documents: Vec<AdviceDocument>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
}

/// Read advice documents from a persisted corpus file.
///
/// Accepts either a single JSON array of records or line-delimited records;
/// the array form is tried first, then the per-line form. Each record must
/// carry a non-empty `advice` field.
#[inline]
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<AdviceDocument>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        TriageError::CorpusLoad(format!("Failed to read corpus file {}: {}", path.display(), e))
    })?;

    let documents = parse_documents(&content)
        .map_err(|e| TriageError::CorpusLoad(format!("{} ({})", e, path.display())))?;

    info!(
        "Loaded {} advice documents from {}",
        documents.len(),
        path.display()
    );
    Ok(documents)
}

fn parse_documents(content: &str) -> std::result::Result<Vec<AdviceDocument>, String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("Corpus file is empty".to_string());
    }

    // Whole-file JSON array first, line-delimited records as the fallback
    let documents = match serde_json::from_str::<Vec<AdviceDocument>>(trimmed) {
        Ok(documents) => documents,
        Err(_) => trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(number, line)| {
                serde_json::from_str::<AdviceDocument>(line)
                    .map_err(|e| format!("Malformed corpus record on line {}: {}", number + 1, e))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    if documents.is_empty() {
        return Err("Corpus contains no documents".to_string());
    }

    if let Some(position) = documents.iter().position(|d| d.advice.trim().is_empty()) {
        return Err(format!(
            "Corpus record {} is missing the advice text",
            position
        ));
    }

    Ok(documents)
}

impl CorpusIndex {
    /// Embed every document and stack the vectors in document order.
    ///
    /// This is a one-time, blocking, bulk operation; with tens to low
    /// hundreds of documents it dominates startup latency and is never
    /// recomputed per query.
    #[inline]
    pub fn build(documents: Vec<AdviceDocument>, encoder: &dyn TextEncoder) -> Result<Self> {
        if documents.is_empty() {
            return Err(TriageError::CorpusLoad(
                "Cannot build an index over an empty corpus".to_string(),
            ));
        }

        let texts: Vec<String> = documents.iter().map(|d| d.advice.clone()).collect();
        let embeddings = encoder.encode_batch(&texts).map_err(|e| {
            TriageError::CorpusLoad(format!("Failed to embed corpus documents: {}", e))
        })?;

        Self::from_embeddings(documents, embeddings)
    }

    /// Assemble an index from documents and their precomputed embeddings.
    #[inline]
    pub fn from_embeddings(
        documents: Vec<AdviceDocument>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if embeddings.len() != documents.len() {
            return Err(TriageError::CorpusLoad(format!(
                "Embedding matrix has {} rows for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if dimension == 0 {
            return Err(TriageError::CorpusLoad(
                "Corpus embeddings have zero dimension".to_string(),
            ));
        }

        if let Some(row) = embeddings.iter().position(|e| e.len() != dimension) {
            return Err(TriageError::CorpusLoad(format!(
                "Embedding row {} has dimension {} (expected {})",
                row,
                embeddings[row].len(),
                dimension
            )));
        }

        debug!(
            "Corpus index ready: {} documents, {} dimensions",
            documents.len(),
            dimension
        );

        Ok(Self {
            documents,
            embeddings,
            dimension,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn document(&self, index: usize) -> Option<&AdviceDocument> {
        self.documents.get(index)
    }

    #[inline]
    pub fn documents(&self) -> &[AdviceDocument] {
        &self.documents
    }

    #[inline]
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }
}
