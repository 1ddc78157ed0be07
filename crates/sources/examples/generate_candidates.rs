//! Example: Build a profile and retrieve candidates for a user
//!
//! Run with: cargo run --package sources --example generate_candidates
//!
//! This example shows how to:
//! 1. Load the sample catalog
//! 2. Build the user's profile
//! 3. Retrieve the eligible candidate pool
//! 4. Display the results

use data_loader::{ContentStore, DataIndex};
use sources::{CandidateRetriever, ProfileBuilder};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== Candidate Retrieval Example ===\n");

    println!("Loading catalog...");
    let start = Instant::now();
    let index = DataIndex::load_from_files(Path::new("data/recs"))?;
    let (users, items, interactions) = index.counts();
    println!(
        "Loaded {} users, {} items, {} interactions in {:?}\n",
        users,
        items,
        interactions,
        start.elapsed()
    );
    let store: Arc<dyn ContentStore> = Arc::new(index);

    let user_id = 1;
    let builder = ProfileBuilder::new(store.clone());
    let retriever = CandidateRetriever::new(store.clone());

    let start = Instant::now();
    let (profile, candidates) = tokio::join!(
        builder.build_profile(user_id),
        retriever.retrieve_candidates(user_id),
    );
    let elapsed = start.elapsed();
    let profile = profile?;
    let candidates = candidates?;

    println!("Profile for user {} (built in {:?}):", user_id, elapsed);
    println!("  Views in window: {}", profile.view_history.len());
    println!("  Likes in window: {}", profile.like_history.len());
    println!("  Duration preference: {:?}", profile.duration_preference);
    println!("  Profile strength: {:.2}", profile.profile_strength);
    for (category, count) in profile.top_categories(3) {
        println!("  - {}: {} views", category, count);
    }

    println!("\n{} eligible candidates. Newest 5:", candidates.len());
    for (i, item) in candidates.iter().take(5).enumerate() {
        println!(
            "  {}. item {} [{}] {}s by creator {} ({} views)",
            i + 1,
            item.id,
            item.category,
            item.duration_secs,
            item.creator_id,
            item.view_count
        );
    }

    let in_favorite = candidates
        .iter()
        .filter(|item| profile.category_affinity(&item.category) > 0)
        .count();
    println!("\nCandidates in a category the user has viewed: {}", in_favorite);

    Ok(())
}
