use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use perinatal_triage::corpus::{AdviceDocument, CorpusIndex};
use perinatal_triage::retrieval::ranker::rank_top_k;

const DOCUMENTS: usize = 200;
const DIMENSION: usize = 384;

/// Deterministic pseudo-random vectors so runs are comparable
fn synthetic_vector(seed: usize) -> Vec<f32> {
    let mut state = (seed as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..DIMENSION)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / (u32::MAX as f32)) - 0.5
        })
        .collect()
}

fn synthetic_index() -> CorpusIndex {
    let documents = (0..DOCUMENTS)
        .map(|i| AdviceDocument {
            advice: format!("synthetic advice passage {}", i),
            source: "bench".to_string(),
            page_number: None,
        })
        .collect();
    let embeddings = (0..DOCUMENTS).map(synthetic_vector).collect();
    CorpusIndex::from_embeddings(documents, embeddings).expect("can build index")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let index = synthetic_index();
    let query = synthetic_vector(DOCUMENTS + 1);

    c.bench_function("rank_top_k", |b| {
        b.iter(|| rank_top_k(black_box(&query), black_box(&index), black_box(3)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
