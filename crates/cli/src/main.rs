use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use server::{Config, MovieRecommendation, RecommendationOrchestrator};
use similarity::{ScoredMovie, SimilarityError};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Find movies similar to one you liked, from MovieLens ratings and genres", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and extract the MovieLens dataset (no-op if already present)
    Fetch,

    /// Recommend movies similar to a title, with poster, plot and runtime
    Recommend {
        /// Exact movie title, e.g. "Toy Story (1995)"
        #[arg(long)]
        title: String,

        /// Number of recommendations (defaults to TOP_N)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show similarity scores without fetching metadata
    Similar {
        /// Exact movie title
        #[arg(long)]
        title: String,

        /// Number of movies to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run benchmark to test ranking latency
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
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let result = match cli.command {
        Commands::Fetch => handle_fetch(&config).await,
        Commands::Recommend { title, limit } => {
            let limit = limit.unwrap_or(config.top_n);
            handle_recommend(&config, &title, limit).await
        }
        Commands::Similar { title, limit } => handle_similar(&config, &title, limit).await,
        Commands::Search { title } => handle_search(&config, &title).await,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&config, requests, concurrent).await,
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<SimilarityError>() {
            Some(SimilarityError::TitleNotFound(title)) => {
                eprintln!(
                    "{} No rated movie is titled '{}'. Try `reel-recs search --title \"...\"` and use the exact title.",
                    "✗".red(),
                    title
                );
                Ok(ExitCode::FAILURE)
            }
            _ => Err(e),
        },
    }
}

/// Load the dataset and build the orchestrator, reporting progress
async fn load_orchestrator(config: &Config) -> Result<RecommendationOrchestrator> {
    println!("Loading MovieLens dataset from {}...", config.data_dir.display());
    let start = Instant::now();
    let orchestrator = RecommendationOrchestrator::from_config(config)
        .await
        .context("Failed to load MovieLens dataset")?;
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());
    Ok(orchestrator)
}

/// Handle the 'fetch' command
async fn handle_fetch(config: &Config) -> Result<()> {
    let url = config.dataset_url.clone();
    let dest = config.dataset_root.clone();
    println!("Fetching {} into {}...", url, dest.display());

    let downloaded = tokio::task::spawn_blocking(move || {
        data_loader::fetch::download_and_extract(&url, &dest)
    })
    .await
    .context("Download task panicked")?
    .context("Failed to fetch dataset")?;

    if downloaded {
        println!("{} Dataset downloaded and extracted", "✓".green());
    } else {
        println!(
            "{} {} already has data, nothing to do",
            "✓".green(),
            config.dataset_root.display()
        );
    }
    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(config: &Config, title: &str, limit: usize) -> Result<()> {
    let orchestrator = load_orchestrator(config).await?;
    let recommendations = orchestrator.get_recommendations(title, limit).await?;
    print_recommendations(title, &recommendations);
    Ok(())
}

/// Handle the 'similar' command
async fn handle_similar(config: &Config, title: &str, limit: usize) -> Result<()> {
    let orchestrator = load_orchestrator(config).await?;
    let ranked = orchestrator.similar_movies(title).await?;
    print_similar(&orchestrator, title, &ranked[..limit.min(ranked.len())]);
    Ok(())
}

/// Handle the 'search' command
async fn handle_search(config: &Config, title: &str) -> Result<()> {
    let orchestrator = load_orchestrator(config).await?;
    let data_index = orchestrator.data_index();
    let matches = data_index.search_titles(title);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  (no matches)");
        return Ok(());
    }
    for movie in matches.iter().take(20) {
        let (avg_rating, rating_count) = data_index
            .get_movie_stats(movie.id)
            .map(|s| (s.avg_rating, s.rating_count))
            .unwrap_or((0.0, 0));
        println!(
            "{}: {} [{}] avg {:.2} ({} ratings)",
            movie.id.to_string().green(),
            movie.title,
            movie.genres.join(", "),
            avg_rating,
            rating_count
        );
    }
    if matches.len() > 20 {
        println!("  ... and {} more", matches.len() - 20);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(config: &Config, requests: usize, concurrent: usize) -> Result<()> {
    let orchestrator = load_orchestrator(config).await?;
    let titles: Vec<String> = orchestrator
        .data_index()
        .rated_movie_titles()
        .into_iter()
        .map(str::to_string)
        .collect();
    if titles.is_empty() || requests == 0 {
        println!("Nothing to benchmark");
        return Ok(());
    }

    // Pick random titles; repeats hit the result cache
    let picks: Vec<String> = (0..requests)
        .map(|_| titles[rand::random_range(0..titles.len())].clone())
        .collect();

    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();
    let mut handles = vec![];
    for title in picks {
        let orchestrator = orchestrator.clone();
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            orchestrator.similar_movies(&title).await?;
            debug!("Ranked '{}'", title);
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    let total_time = wall_clock.elapsed();

    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / (timings.len() as u32);
    timings.sort();
    let p50 = timings[timings.len() / 2];
    let p95 = timings[(timings.len() as f32 * 0.95) as usize];
    let p99 = timings[(timings.len() as f32 * 0.99) as usize];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_recommendations(title: &str, recommendations: &[MovieRecommendation]) {
    println!("{}", format!("Because you liked {}:", title).bold().blue());
    if recommendations.is_empty() {
        println!("  (no recommendations with metadata available)");
        return;
    }
    for (i, rec) in recommendations.iter().enumerate() {
        let info = &rec.info;
        println!(
            "{}. {} - Score: {:.3}",
            (i + 1).to_string().green(),
            info.title.bold(),
            rec.score
        );
        println!("   Released: {}  Runtime: {}", info.released, info.runtime);
        if let Some(poster) = info.poster_url() {
            println!("   Poster: {}", poster.cyan());
        }
        if !info.plot.is_empty() {
            println!("   {}", info.plot);
        }
    }
}

fn print_similar(orchestrator: &RecommendationOrchestrator, title: &str, ranked: &[ScoredMovie]) {
    println!("{}", format!("Movies similar to {}:", title).bold().blue());
    for (i, scored) in ranked.iter().enumerate() {
        let movie_title = orchestrator
            .data_index()
            .get_movie(scored.movie_id)
            .map(|m| m.title.as_str())
            .unwrap_or("<unknown>");
        println!(
            "{}. {} ({}) - Score: {:.4}",
            (i + 1).to_string().green(),
            movie_title,
            scored.movie_id,
            scored.score
        );
    }
}
