//! Simple test harness for the recommendation service.
//!
//! Requests recommendations for one user and prints them.
//!
//! Usage: server [USER_ID] [LIMIT]

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipeline::RequestContext;
use server::{EngineConfig, RecommendationService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting recommendation service test harness");

    let config = EngineConfig::from_env().context("Invalid RECS_* configuration")?;
    let service = RecommendationService::from_config(&config)
        .await
        .context("Failed to initialize recommendation service")?;

    let mut args = std::env::args().skip(1);
    let user_id: u64 = match args.next() {
        Some(arg) => arg.parse().context("USER_ID must be an integer")?,
        None => 1,
    };
    let limit: Option<usize> = match args.next() {
        Some(arg) => Some(arg.parse().context("LIMIT must be an integer")?),
        None => None,
    };

    info!(
        "Getting recommendations for user {} (limit: {})",
        user_id,
        limit.unwrap_or(service.default_limit())
    );
    let recommendations = service
        .get_personalized_recommendations(user_id, limit, RequestContext::default())
        .await?;

    info!("Received {} recommendations:", recommendations.len());
    for (i, rec) in recommendations.iter().enumerate() {
        info!(
            "{}. item {} [{}] {}s - Score: {:.3}",
            i + 1,
            rec.item.id,
            rec.item.category,
            rec.item.duration_secs,
            rec.score
        );
        info!("   {}", rec.explanation);
    }

    // Give the detached audit write a moment before the runtime shuts down
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Ok(())
}
