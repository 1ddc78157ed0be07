use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{ContentStore, DataIndex, UserId};
use pipeline::{Device, ExplainedRecommendation, RequestContext};
use rand::seq::IndexedRandom;
use server::{EngineConfig, RecommendationService};
use sources::{CandidateRetriever, ProfileBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// recs - personalized recommendation ranking engine
#[derive(Parser)]
#[command(name = "recs")]
#[command(about = "Rank, explain and benchmark personalized recommendations", long_about = None)]
struct Cli {
    /// Dataset directory (overrides RECS_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get ranked recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return (default: RECS_DEFAULT_LIMIT)
        #[arg(long)]
        limit: Option<usize>,

        /// Device class of the request: mobile or desktop
        #[arg(long)]
        device: Option<Device>,

        /// Apply the time-of-day bonus
        #[arg(long)]
        time_of_day: bool,

        /// Show the score breakdown for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show the preference profile built from a user's history
    Profile {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// List the eligible candidate pool for a user
    Candidates {
        /// User ID to list candidates for
        #[arg(long)]
        user_id: UserId,

        /// Number of candidates to show
        #[arg(long, default_value = "20")]
        limit: usize,
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

    let mut config = EngineConfig::from_env().context("Invalid RECS_* configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.display().to_string();
    }

    println!("Loading catalog from {}...", config.data_dir);
    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(Path::new(&config.data_dir)).context("Failed to load catalog dataset")?,
    );
    let (users, items, interactions) = data_index.counts();
    println!(
        "{} Loaded {} users, {} items, {} interactions in {:?}",
        "✓".green(),
        users,
        items,
        interactions,
        start.elapsed()
    );

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            device,
            time_of_day,
            explain,
        } => {
            let context = RequestContext { time_of_day, device };
            handle_recommend(data_index, &config, user_id, limit, context, explain).await?
        }
        Commands::Profile { user_id } => handle_profile(data_index, &config, user_id).await?,
        Commands::Candidates { user_id, limit } => {
            handle_candidates(data_index, &config, user_id, limit).await?
        }
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(data_index, &config, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    data_index: Arc<DataIndex>,
    config: &EngineConfig,
    user_id: UserId,
    limit: Option<usize>,
    context: RequestContext,
    explain: bool,
) -> Result<()> {
    if data_index.get_user(user_id).is_none() {
        println!(
            "{} User {} not found, ranking from popularity, recency and context only",
            "!".yellow(),
            user_id
        );
    }

    let service = RecommendationService::with_store(data_index, config).await?;
    let start = Instant::now();
    let recommendations = service
        .get_personalized_recommendations(user_id, limit, context)
        .await?;
    let elapsed = start.elapsed();

    if recommendations.is_empty() {
        println!("{}", "No eligible items to recommend.".yellow());
        return Ok(());
    }
    print_recommendations(&recommendations, explain);
    println!("\nRanked in {:?}", elapsed);

    // Let the detached audit write finish before exiting
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}

/// Handle the 'profile' command
async fn handle_profile(data_index: Arc<DataIndex>, config: &EngineConfig, user_id: UserId) -> Result<()> {
    let user = data_index
        .get_user(user_id)
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;

    let builder = ProfileBuilder::new(data_index.clone())
        .with_view_window(config.view_history_limit)
        .with_like_window(config.like_history_limit);
    let profile = builder.build_profile(user_id).await?;

    println!("{}", format!("User {} ({})", user_id, user.username).bold().blue());
    println!("{}Views in window: {}", "• ".green(), profile.view_history.len());
    println!("{}Likes in window: {}", "• ".green(), profile.like_history.len());
    println!("{}Duration preference: {:?}", "• ".green(), profile.duration_preference);
    println!("{}Profile strength: {:.2}", "• ".green(), profile.profile_strength);

    println!("Top categories:");
    for (category, count) in profile.top_categories(5) {
        println!("  - {}: {} views", category, count);
    }

    let mut creators: Vec<_> = profile.creators.iter().collect();
    creators.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    println!("Favorite creators:");
    for (creator_id, count) in creators.into_iter().take(5) {
        println!("  - creator {}: {} likes", creator_id, count);
    }

    println!("Recently viewed:");
    for item_id in profile.view_history.iter().take(5) {
        if let Some(item) = data_index.get_item(*item_id) {
            println!("  - item {} [{}] {}s", item.id, item.category, item.duration_secs);
        }
    }
    Ok(())
}

/// Handle the 'candidates' command
async fn handle_candidates(
    data_index: Arc<DataIndex>,
    config: &EngineConfig,
    user_id: UserId,
    limit: usize,
) -> Result<()> {
    let store: Arc<dyn ContentStore> = data_index;
    let retriever = CandidateRetriever::new(store).with_cap(config.candidate_limit);

    let start = Instant::now();
    let candidates = retriever.retrieve_candidates(user_id).await?;
    let elapsed = start.elapsed();

    println!(
        "{}",
        format!("{} eligible candidates for user {} (retrieved in {:?}):", candidates.len(), user_id, elapsed)
            .bold()
            .blue()
    );
    for item in candidates.iter().take(limit) {
        println!(
            "  {} [{}] {}s by creator {} - {} views, {} likes, created {}",
            item.id,
            item.category,
            item.duration_secs,
            item.creator_id,
            item.view_count,
            item.like_count,
            item.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    data_index: Arc<DataIndex>,
    config: &EngineConfig,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_pool = data_index.get_all_user_ids();
    if user_pool.is_empty() {
        return Err(anyhow!("Dataset has no users to benchmark with"));
    }

    let service = RecommendationService::with_store(data_index, config).await?;

    // Random users from the dataset; repeats exercise the cache
    let mut rng = rand::rng();
    let user_ids: Vec<UserId> = (0..requests)
        .filter_map(|_| user_pool.choose(&mut rng).copied())
        .collect();

    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall = Instant::now();
    let mut handles = vec![];
    for user in user_ids {
        let service = service.clone();
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            service
                .get_personalized_recommendations(user, None, RequestContext::default())
                .await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    let wall_time = wall.elapsed();

    if timings.is_empty() {
        println!("No requests made.");
        return Ok(());
    }

    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = timings.len() as f32 / wall_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", timings.len(), concurrent);
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[ExplainedRecommendation], explain: bool) {
    println!("{}", "Recommendations:".bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. item {} [{}] {}s by creator {} - Score: {:.3}",
            (i + 1).to_string().green(),
            rec.item.id,
            rec.item.category,
            rec.item.duration_secs,
            rec.item.creator_id,
            rec.score
        );
        println!("   {}", rec.explanation.italic());
        if explain {
            let b = &rec.score_breakdown;
            println!(
                "   collaborative {:.2} | content {:.2} | context {:.2} | popularity {:.2} | recency {:.2}",
                b.collaborative, b.content, b.context, b.popularity, b.recency
            );
        }
    }
}
