//! # Data Loader Crate
//!
//! This crate handles fetching, loading and indexing the MovieLens
//! `ml-latest-small` dataset.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, Link, Tag, DataIndex)
//! - **parser**: Parse the CSV files into Rust structs
//! - **index**: Build indices, statistics and catalogue search
//! - **fetch**: Download and extract the dataset archive
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{fetch, DataIndex};
//! use std::path::Path;
//!
//! fetch::download_and_extract(fetch::DEFAULT_DATASET_URL, Path::new("data"))?;
//! let index = DataIndex::load_from_files(Path::new("data/ml-latest-small"))?;
//!
//! let joined = index.join_ratings();
//! println!("{} joined rating rows", joined.len());
//! ```

// Public modules
pub mod error;
pub mod fetch;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    MovieId,
    UserId,
    // Core types
    DataIndex,
    Link,
    Movie,
    MovieStats,
    Rating,
    Tag,
    UserMovieRating,
};
