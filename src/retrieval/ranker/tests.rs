use super::*;
use crate::corpus::AdviceDocument;

fn doc(text: &str) -> AdviceDocument {
    AdviceDocument {
        advice: text.to_string(),
        source: "test".to_string(),
        page_number: None,
    }
}

fn index_from(embeddings: Vec<Vec<f32>>) -> CorpusIndex {
    let documents = (0..embeddings.len())
        .map(|i| doc(&format!("document {}", i)))
        .collect();
    CorpusIndex::from_embeddings(documents, embeddings).expect("can build index")
}

#[test]
fn cosine_of_identical_vectors_is_one() {
    let similarity = cosine_similarity(&[3.0, 4.0], &[3.0, 4.0]).expect("defined");
    assert!((similarity - 1.0).abs() < 1e-6);
}

#[test]
fn cosine_of_orthogonal_vectors_is_zero() {
    let similarity = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("defined");
    assert!(similarity.abs() < 1e-6);
}

#[test]
fn cosine_is_undefined_for_zero_norm() {
    assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_none());
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]).is_none());
}

#[test]
fn cosine_is_undefined_for_mismatched_lengths() {
    assert!(cosine_similarity(&[1.0, 0.0], &[1.0]).is_none());
}

#[test]
fn ranks_by_descending_similarity() {
    // Similarities against [1, 0]: 1.0, 0.0, ~0.994
    let index = index_from(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]]);

    let matches = rank_top_k(&[1.0, 0.0], &index, 2).expect("can rank");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].index, 0);
    assert_eq!(matches[1].index, 2);
    assert!((matches[0].score - 1.0).abs() < 1e-6);
    assert!(matches[1].score > 0.99);
}

#[test]
fn ties_break_by_corpus_order() {
    // Rows 1 and 2 are parallel, so their similarities are identical
    let index = index_from(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0]]);

    let matches = rank_top_k(&[1.0, 0.0], &index, 3).expect("can rank");
    assert_eq!(matches[0].index, 1);
    assert_eq!(matches[1].index, 2);
    assert_eq!(matches[2].index, 0);
}

#[test]
fn zero_norm_row_ranks_last_without_error() {
    let index = index_from(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![-1.0, 0.0]]);

    let matches = rank_top_k(&[1.0, 0.0], &index, 3).expect("can rank");
    assert_eq!(matches[0].index, 1);
    // The anti-parallel row still has a defined score and outranks the
    // degenerate one
    assert_eq!(matches[1].index, 2);
    assert_eq!(matches[2].index, 0);
    assert!(matches.iter().all(|m| !m.score.is_nan()));
}

#[test]
fn k_larger_than_corpus_returns_everything_once() {
    let index = index_from(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

    let matches = rank_top_k(&[1.0, 1.0], &index, 10).expect("can rank");
    assert_eq!(matches.len(), 2);
    let mut indices: Vec<usize> = matches.iter().map(|m| m.index).collect();
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices.len(), 2);
}

#[test]
fn zero_k_is_rejected() {
    let index = index_from(vec![vec![1.0, 0.0]]);

    let err = rank_top_k(&[1.0, 0.0], &index, 0).expect_err("k = 0 must fail");
    assert!(matches!(err, TriageError::InvalidArgument(_)));
}

#[test]
fn dimension_mismatch_is_rejected() {
    let index = index_from(vec![vec![1.0, 0.0]]);

    let err = rank_top_k(&[1.0, 0.0, 0.0], &index, 1).expect_err("mismatch must fail");
    assert!(matches!(err, TriageError::InvalidArgument(_)));
}

#[test]
fn ranking_is_deterministic() {
    let index = index_from(vec![
        vec![0.2, 0.8],
        vec![0.5, 0.5],
        vec![0.8, 0.2],
        vec![0.3, 0.7],
    ]);

    let first = rank_top_k(&[0.6, 0.4], &index, 4).expect("can rank");
    let second = rank_top_k(&[0.6, 0.4], &index, 4).expect("can rank");
    assert_eq!(first, second);
}
