//! Simple test harness for the recommendation orchestrator.
//!
//! Loads the dataset named by the configuration, requests recommendations
//! for one title (first argument, default "Toy Story (1995)") and logs them.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{Config, RecommendationOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,similarity=debug")),
        )
        .init();

    info!("Starting ReelRecs server test harness");

    let config = Config::from_env().context("Failed to load configuration")?;
    let orchestrator = RecommendationOrchestrator::from_config(&config).await?;

    let title = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Toy Story (1995)".to_string());

    info!("Getting recommendations for '{}' (limit: {})", title, config.top_n);
    let recommendations = orchestrator
        .get_recommendations(&title, config.top_n)
        .await?;

    info!("Received {} recommendations:", recommendations.len());
    for (i, rec) in recommendations.iter().enumerate() {
        info!(
            "{}. {} [{}] - Score: {:.3}",
            i + 1,
            rec.info.title,
            rec.imdb_id,
            rec.score
        );
        info!("   Released: {}, Runtime: {}", rec.info.released, rec.info.runtime);
        info!("   {}", rec.info.plot);
    }

    Ok(())
}
