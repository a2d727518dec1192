use store_data::StoreIndex;
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let data_dir = Path::new("data/seoul");

    println!("Loading store dataset...\n");

    let start = Instant::now();
    let index = StoreIndex::load_from_files(data_dir)?;
    let elapsed = start.elapsed();

    let (stores, reviewers, reviews) = index.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Stores: {}", stores);
    println!("Reviewers: {}", reviewers);
    println!("Reviews: {}", reviews);
    println!("\nPerformance: {:.0} reviews/second",
             reviews as f64 / elapsed.as_secs_f64());
    Ok(())
}
