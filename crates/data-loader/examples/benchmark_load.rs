//! Times loading, joining and searching the `ml-latest-small` dataset.
//!
//! Run from the workspace root after `reel-recs fetch`:
//! `cargo run --release --example benchmark_load -p data-loader`

use data_loader::DataIndex;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/ml-latest-small");
    println!("Loading {}...", data_dir.display());

    let start = Instant::now();
    let index = DataIndex::load_from_files(data_dir).expect("Failed to load dataset");
    let load_time = start.elapsed();

    let (movies, ratings, links, tags) = index.counts();
    println!(
        "Loaded {} movies, {} ratings, {} links, {} tags in {:?} ({:.0} ratings/s)",
        movies,
        ratings,
        links,
        tags,
        load_time,
        ratings as f64 / load_time.as_secs_f64()
    );

    let start = Instant::now();
    let joined = index.join_ratings();
    println!("Joined {} rows in {:?}", joined.len(), start.elapsed());

    let start = Instant::now();
    let titles = index.rated_movie_titles();
    println!("{} distinct rated titles in {:?}", titles.len(), start.elapsed());

    let start = Instant::now();
    let hits = index.search_titles("star wars");
    println!("Search 'star wars': {} hits in {:?}", hits.len(), start.elapsed());
}
