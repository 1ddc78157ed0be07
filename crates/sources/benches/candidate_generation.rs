//! Benchmarks for profile building and candidate retrieval
//!
//! Run with: cargo bench --package sources
//!
//! Uses the sample catalog under data/recs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{ContentStore, DataIndex};
use sources::{CandidateRetriever, ProfileBuilder};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn load_test_data() -> Arc<dyn ContentStore> {
    let data_dir = Path::new("../../data/recs");
    let index = DataIndex::load_from_files(data_dir).expect("Failed to load test data");
    Arc::new(index)
}

fn bench_retrieve_candidates(c: &mut Criterion) {
    let rt = Runtime::new().expect("Failed to start runtime");
    let retriever = CandidateRetriever::new(load_test_data());

    c.bench_function("retrieve_candidates", |b| {
        b.iter(|| {
            let candidates = rt.block_on(retriever.retrieve_candidates(black_box(1))).unwrap();
            black_box(candidates)
        })
    });
}

fn bench_build_profile(c: &mut Criterion) {
    let rt = Runtime::new().expect("Failed to start runtime");
    let builder = ProfileBuilder::new(load_test_data());

    c.bench_function("build_profile", |b| {
        b.iter(|| {
            let profile = rt.block_on(builder.build_profile(black_box(1))).unwrap();
            black_box(profile)
        })
    });
}

fn bench_concurrent_profile_and_candidates(c: &mut Criterion) {
    let rt = Runtime::new().expect("Failed to start runtime");
    let store = load_test_data();
    let builder = ProfileBuilder::new(store.clone());
    let retriever = CandidateRetriever::new(store);

    c.bench_function("profile_and_candidates_joined", |b| {
        b.iter(|| {
            let result = rt.block_on(async {
                tokio::join!(
                    builder.build_profile(black_box(1)),
                    retriever.retrieve_candidates(black_box(1)),
                )
            });
            black_box(result)
        })
    });
}

criterion_group!(
    benches,
    bench_retrieve_candidates,
    bench_build_profile,
    bench_concurrent_profile_and_candidates
);
criterion_main!(benches);
