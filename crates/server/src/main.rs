//! Simple test harness for the recommendation orchestrator.
//!
//! Loads the demo dataset and prints recommendations for one user.
//! Override the defaults with `PLATE_DATA_DIR` and `PLATE_CONFIG`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{EngineConfig, RecommendRequest, RecommendationOrchestrator};
use store_data::{Coordinates, StoreIndex};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,sources=debug,pipeline=debug")),
        )
        .init();

    info!("Starting recommendation server test harness");

    let config = match std::env::var_os("PLATE_CONFIG") {
        Some(path) => EngineConfig::load(&PathBuf::from(path))?,
        None => EngineConfig::default(),
    };

    let data_dir = std::env::var_os("PLATE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/seoul"));
    info!("Loading store index from {}", data_dir.display());
    let index = Arc::new(tokio::task::spawn_blocking(move || StoreIndex::load_from_files(&data_dir)).await??);

    let orchestrator = RecommendationOrchestrator::from_index(config, index)?;

    // Gangnam station
    let user_id = 1;
    let request = RecommendRequest::new()
        .with_location(Coordinates::new(37.4979, 127.0276))
        .with_limit(10);

    let result = orchestrator.recommend(user_id, &request).await?;

    info!("Received {} recommendations ({:?}):", result.items.len(), result.status);
    for (i, rec) in result.items.iter().enumerate() {
        info!(
            "{}. {} [{}] - Score: {:.3} ({})",
            i + 1,
            rec.name.as_deref().unwrap_or("<unnamed>"),
            rec.category.map_or("?", |c| c.as_str()),
            rec.score,
            rec.reason
        );
        info!("   {}", rec.explanation);
    }
    for excluded in &result.strategies_excluded {
        info!("Excluded {}: {}", excluded.strategy, excluded.reason);
    }

    Ok(())
}
