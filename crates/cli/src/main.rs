use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use server::{EngineConfig, RecommendRequest, RecommendationOrchestrator, RecommendationResult, ResultStatus};
use sources::StrategyKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store_data::{Coordinates, FoodCategory, StoreId, StoreIndex, UserId};
use tokio::sync::Semaphore;
use tracing::info;

/// PlateRecs - Store Recommendation Engine
#[derive(Parser)]
#[command(name = "plate-recs")]
#[command(about = "Store recommendations from taste profiles, location and popularity", long_about = None)]
struct Cli {
    /// Path to the store dataset directory
    #[arg(short, long, default_value = "data/seoul")]
    data_dir: PathBuf,

    /// Engine configuration (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get store recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Only recommend stores in this category (e.g. korean, cafe, fast_food)
        #[arg(long)]
        category: Option<FoodCategory>,

        /// Required tags, comma separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Latitude of the user's position
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude of the user's position
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Search radius in meters
        #[arg(long)]
        radius: Option<f64>,

        /// Number of recommendations to return
        #[arg(long)]
        limit: Option<usize>,

        /// Strategies to run, comma separated (ai, location, popularity, collaborative)
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,

        /// Show per-strategy scores for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Analyze and show a user's taste profile
    Analyze {
        /// User ID to analyze
        #[arg(long)]
        user_id: UserId,
    },

    /// Show a store's details, or search stores by name
    Store {
        /// Store ID to display
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        id: Option<StoreId>,

        /// Store name to search for (case-insensitive substring match)
        #[arg(long)]
        name: Option<String>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    println!("Loading store dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let index = Arc::new(
        StoreIndex::load_from_files(&cli.data_dir).context("Failed to load store dataset")?,
    );
    let (stores, reviewers, reviews) = index.counts();
    println!(
        "{} Loaded {} stores, {} reviews from {} reviewers in {:?}",
        "✓".green(),
        stores,
        reviews,
        reviewers,
        start.elapsed()
    );

    match cli.command {
        Commands::Recommend {
            user_id,
            category,
            tags,
            lat,
            lon,
            radius,
            limit,
            strategies,
            explain,
        } => {
            let mut request = RecommendRequest::new().with_tags(tags);
            if let Some(category) = category {
                request = request.with_category(category);
            }
            if let (Some(lat), Some(lon)) = (lat, lon) {
                request = request.with_location(Coordinates::new(lat, lon));
            }
            if let Some(radius) = radius {
                request = request.with_radius(radius);
            }
            if let Some(limit) = limit {
                request = request.with_limit(limit);
            }
            if !strategies.is_empty() {
                request = request.with_strategies(strategies);
            }
            handle_recommend(config, index, user_id, request, explain).await?
        }
        Commands::Analyze { user_id } => handle_analyze(config, index, user_id).await?,
        Commands::Store { id: Some(id), .. } => handle_store(&index, id)?,
        Commands::Store { name, .. } => handle_search(&index, name.as_deref().unwrap_or_default()),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(config, index, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    config: EngineConfig,
    index: Arc<StoreIndex>,
    user_id: UserId,
    request: RecommendRequest,
    explain: bool,
) -> Result<()> {
    let orchestrator = RecommendationOrchestrator::from_index(config, index)?;
    let result = orchestrator.recommend(user_id, &request).await?;
    print_recommendations(&result, explain);
    Ok(())
}

/// Handle the 'analyze' command
async fn handle_analyze(config: EngineConfig, index: Arc<StoreIndex>, user_id: UserId) -> Result<()> {
    if index.get_user_reviews(user_id).is_empty() {
        return Err(anyhow!("User {} has no reviews", user_id));
    }

    let orchestrator = RecommendationOrchestrator::from_index(config, index.clone())?;
    let profile = orchestrator.analyze_taste_profile(user_id).await?;

    println!("{}", format!("Taste profile for user {}", user_id).bold().blue());

    println!("Preferred categories:");
    for category in &profile.preferred_categories {
        println!(
            "  {}{:<10} {:.2}",
            "• ".green(),
            category.as_str(),
            profile.category_score(*category)
        );
    }

    if !profile.preferred_tags.is_empty() {
        println!("Preferred tags: {}", profile.preferred_tags.join(", ").cyan());
    }

    let describe = |value: Option<f64>| value.map_or("not enough data".dimmed().to_string(), |v| format!("{v:.2}"));
    println!("Price preference:    {}", describe(profile.price_preference.value()));
    println!("Distance preference: {}", describe(profile.distance_preference.value()));

    println!("Behaviour patterns:");
    for (name, value) in &profile.behavior_patterns {
        println!("  {}{}: {}", "• ".cyan(), name, serde_json::to_string(value)?);
    }

    let mut reviews: Vec<_> = index.get_user_reviews(user_id).iter().collect();
    reviews.sort_by(|a, b| b.rating.total_cmp(&a.rating).then_with(|| b.created_at.cmp(&a.created_at)));
    println!("Top rated stores:");
    for review in reviews.iter().take(5) {
        if let Some(store) = index.get_store(review.store_id) {
            println!("  - {} [{}] (Rating: {:.1})", store.name, store.category, review.rating);
        }
    }
    Ok(())
}

/// Handle the 'store' command for a single store
fn handle_store(index: &StoreIndex, store_id: StoreId) -> Result<()> {
    let store = index
        .get_store(store_id)
        .ok_or_else(|| anyhow!("Store {} not found", store_id))?;

    println!("{}", format!("{} (#{})", store.name, store.id).bold().blue());
    println!("{}Category: {}", "• ".green(), store.category);
    println!(
        "{}Location: {:.5}, {:.5}",
        "• ".green(),
        store.coordinates.lat,
        store.coordinates.lon
    );
    println!("{}Tags: {}", "• ".green(), store.tags.join(", "));
    if let Some(level) = store.price_level {
        println!("{}Price: {}", "• ".green(), "₩".repeat(level as usize));
    }

    match index.get_store_stats(store_id) {
        Some(stats) => println!(
            "{}Average rating: {:.2} ({} reviews)",
            "• ".cyan(),
            stats.avg_rating,
            stats.review_count
        ),
        None => println!("{}No reviews yet", "• ".cyan()),
    }

    let mut reviews: Vec<_> = index.get_store_reviews(store_id).iter().collect();
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if !reviews.is_empty() {
        println!("Latest reviews:");
    }
    for review in reviews.iter().take(5) {
        println!(
            "  - user {} rated {:.1}: {}",
            review.user_id,
            review.rating,
            review.content.dimmed()
        );
    }
    Ok(())
}

/// Handle the 'store' command when searching by name
fn handle_search(index: &StoreIndex, name: &str) {
    let needle = name.to_lowercase();

    // (relevance, avg rating, store id); exact matches first
    let mut matches: Vec<(u8, f32, StoreId)> = index
        .stores()
        .filter_map(|store| {
            let haystack = store.name.to_lowercase();
            let relevance = if haystack == needle {
                0
            } else if haystack.contains(&needle) {
                1
            } else {
                return None;
            };
            let rating = index.get_store_stats(store.id).map_or(0.0, |s| s.avg_rating);
            Some((relevance, rating, store.id))
        })
        .collect();
    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.total_cmp(&a.1)).then_with(|| a.2.cmp(&b.2)));

    println!("{}", format!("Search results for '{}':", name).bold().blue());
    for (_, _, store_id) in matches.iter().take(20) {
        let Some(store) = index.get_store(*store_id) else {
            continue;
        };
        let (rating, reviews) = index
            .get_store_stats(store.id)
            .map_or((0.0, 0), |s| (s.avg_rating, s.review_count));
        println!(
            "{}: {} [{}] {} avg {:.2} ({} reviews)",
            store.id,
            store.name,
            store.category,
            store.tags.join(", ").dimmed(),
            rating,
            reviews
        );
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    config: EngineConfig,
    index: Arc<StoreIndex>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_ids = index.reviewer_ids();
    if user_ids.is_empty() || requests == 0 {
        return Err(anyhow!("Nothing to benchmark: no reviewers or zero requests"));
    }
    let orchestrator = RecommendationOrchestrator::from_index(config, index)?;
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));

    info!("Benchmarking {} requests, {} at a time", requests, concurrent);
    let started = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let user_id = user_ids[rand::random_range(0..user_ids.len())];
        // Somewhere in central Seoul
        let location = Coordinates::new(
            rand::random_range(37.48..37.58),
            rand::random_range(126.92..127.06),
        );
        let orchestrator = orchestrator.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let request = RecommendRequest::new().with_location(location);
            let start = Instant::now();
            let result = orchestrator.recommend(user_id, &request).await?;
            Ok::<_, anyhow::Error>((start.elapsed(), result.status))
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    let mut unavailable = 0usize;
    for handle in handles {
        let (elapsed, status) = handle.await??;
        if status == ResultStatus::NoRecommendationsAvailable {
            unavailable += 1;
        }
        timings.push(elapsed);
    }
    let wall_time = started.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", total / timings.len() as u32);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f64 / wall_time.as_secs_f64()
    );
    if unavailable > 0 {
        println!("{} {} requests had no strategy available", "!".yellow(), unavailable);
    }

    Ok(())
}

/// Format and print a recommendation result
fn print_recommendations(result: &RecommendationResult, explain: bool) {
    println!("{}", "Store Recommendations:".bold().blue());

    match result.status {
        ResultStatus::NoRecommendationsAvailable => {
            println!("{}", "No strategy could produce recommendations.".yellow());
        }
        ResultStatus::Empty => println!("{}", "No stores matched the request.".yellow()),
        ResultStatus::Ranked => {}
    }

    for (i, rec) in result.items.iter().enumerate() {
        let distance = rec
            .distance_meters
            .map(|d| format!(" {:.0}m", d))
            .unwrap_or_default();
        println!(
            "{}. {} [{}]{} - Score: {:.3}",
            (i + 1).to_string().green(),
            rec.name.as_deref().unwrap_or("<unnamed>"),
            rec.category.map_or("?", |c| c.as_str()),
            distance,
            rec.score
        );
        if explain {
            let sources = rec
                .source_scores
                .iter()
                .map(|(kind, score)| format!("{kind}={score:.2}"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("   {} ({})", rec.explanation, sources.dimmed());
        }
    }

    if !result.strategies_used.is_empty() {
        let used = result
            .strategies_used
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("Strategies used: {}", used);
    }
    for excluded in &result.strategies_excluded {
        println!("{} {} excluded: {}", "!".yellow(), excluded.strategy, excluded.reason);
    }
    for warning in &result.warnings {
        println!("{} {}", "!".yellow(), warning);
    }
}
