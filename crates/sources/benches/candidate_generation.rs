//! Benchmarks for index-backed candidate generation
//!
//! Run with: cargo bench --package sources
//!
//! Uses the demo dataset under data/seoul.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sources::backends::{AffinityOracle, NearbyStores, NeighborStores, PopularStores};
use sources::{build_taste_profile, AnalyzerSettings};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use store_data::{Coordinates, StoreIndex};

fn load_test_data() -> Arc<StoreIndex> {
    let data_dir = Path::new("../../data/seoul");
    let index = StoreIndex::load_from_files(data_dir).expect("Failed to load test data");
    Arc::new(index)
}

fn bench_nearby(c: &mut Criterion) {
    let nearby = NearbyStores::new(load_test_data());
    let origin = Coordinates::new(37.5, 127.03);

    c.bench_function("nearby_compute", |b| {
        b.iter(|| black_box(nearby.compute(black_box(origin), black_box(3_000.0))))
    });
}

fn bench_popular(c: &mut Criterion) {
    let popular = PopularStores::new(load_test_data()).with_min_review_count(1);

    c.bench_function("popular_compute", |b| {
        b.iter(|| black_box(popular.compute(black_box(None))))
    });
}

fn bench_neighbors(c: &mut Criterion) {
    let neighbors = NeighborStores::new(load_test_data());

    c.bench_function("neighbors_compute", |b| {
        b.iter(|| black_box(neighbors.compute(black_box(1))))
    });
}

fn bench_analyze_and_score(c: &mut Criterion) {
    let index = load_test_data();
    let oracle = AffinityOracle::new(index.clone());
    let settings = AnalyzerSettings::default();
    let interactions = index.interactions_for_user(1);

    c.bench_function("analyze_and_score", |b| {
        b.iter(|| {
            let now = Utc::now();
            let profile = build_taste_profile(1, black_box(&interactions), &settings, now, now);
            black_box(oracle.compute(&profile))
        })
    });
}

criterion_group!(
    benches,
    bench_nearby,
    bench_popular,
    bench_neighbors,
    bench_analyze_and_score
);
criterion_main!(benches);
