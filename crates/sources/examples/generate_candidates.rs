//! Example: Generate candidates for a user
//!
//! Run with: cargo run --package sources --example generate_candidates
//!
//! This example shows how to:
//! 1. Load the demo store dataset
//! 2. Analyze the user's taste profile
//! 3. Run every strategy against the index-backed collaborators
//! 4. Display the results

use sources::backends::{AffinityOracle, NearbyStores, NeighborStores, PopularStores};
use sources::{
    AiPreferenceStrategy, CandidateStrategy, CollaborativeStrategy, LocationStrategy,
    PopularityStrategy, StrategyQuery, TasteProfileAnalyzer,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use store_data::{Coordinates, InMemoryProfileStore, IndexInteractionSource, StoreIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("=== PlateRecs Candidate Generation Example ===\n");

    let start = Instant::now();
    let index = Arc::new(StoreIndex::load_from_files(Path::new("data/seoul"))?);
    let (stores, reviewers, reviews) = index.counts();
    println!(
        "Loaded {} stores, {} reviewers, {} reviews in {:?}\n",
        stores,
        reviewers,
        reviews,
        start.elapsed()
    );

    let user_id = 1;
    let analyzer = TasteProfileAnalyzer::new(
        Arc::new(IndexInteractionSource::new(index.clone())),
        Arc::new(InMemoryProfileStore::new()),
    );
    let profile = analyzer.analyze(user_id).await?;
    println!("Taste profile for user {}:", user_id);
    for category in &profile.preferred_categories {
        println!("  {:<10} {:.3}", category, profile.category_score(*category));
    }
    println!("  Tags: {}\n", profile.preferred_tags.join(", "));

    let strategies: Vec<Box<dyn CandidateStrategy>> = vec![
        Box::new(AiPreferenceStrategy::new(Arc::new(AffinityOracle::new(index.clone())))),
        Box::new(LocationStrategy::new(Arc::new(NearbyStores::new(index.clone())))),
        Box::new(PopularityStrategy::new(Arc::new(
            PopularStores::new(index.clone()).with_min_review_count(1),
        ))),
        Box::new(CollaborativeStrategy::new(Arc::new(NeighborStores::new(index.clone())))),
    ];

    let query = StrategyQuery::new(user_id)
        .with_profile(Arc::new(profile))
        .with_location(Coordinates::new(37.5, 127.03), 3_000.0);

    for strategy in &strategies {
        let start = Instant::now();
        let candidates = strategy.fetch_candidates(&query).await?;
        println!(
            "{}: {} candidates in {:?}",
            strategy.kind(),
            candidates.len(),
            start.elapsed()
        );
        for candidate in candidates.iter().take(3) {
            let name = candidate.attributes.name.as_deref().unwrap_or("?");
            let score = candidate.score_for(strategy.kind()).unwrap_or(0.0);
            println!("  {:>4} {:<24} {:.3}", candidate.store_id, name, score);
        }
    }

    Ok(())
}
