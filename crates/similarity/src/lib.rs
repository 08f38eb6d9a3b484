//! Similarity pipeline for movie-to-movie recommendations.
//!
//! This crate provides:
//! - Matrix builders turning the joined rating table into dense matrices
//! - A Pearson correlation engine over matrix columns
//! - A blender mixing rating and genre similarity into a ranked list
//!
//! ## Architecture
//! The pipeline processes one query in stages:
//! 1. `InteractionMatrixBuilder`: users x movies, mean-centered damped ratings
//! 2. `GenreMatrixBuilder`: genres x movies, 0/1 indicators
//! 3. Correlation engine: movie x movie Pearson coefficients for each matrix
//! 4. `Recommender`: blends both signals and ranks every other movie
//!
//! Everything here is synchronous and pure: the same table and title always
//! produce the same ranking. Caching lives in the service layer.
//!
//! ## Example Usage
//! ```ignore
//! use similarity::Recommender;
//!
//! let table = data_index.join_ratings();
//! let ranked = Recommender::new().recommend("Heat (1995)", &table)?;
//! for scored in ranked.iter().take(10) {
//!     println!("{} {:.3}", scored.movie_id, scored.score);
//! }
//! ```

pub mod blend;
pub mod correlation;
pub mod error;
pub mod genre;
pub mod interaction;
pub mod matrix;
pub mod stats;
pub mod traits;

// Re-export main types
pub use blend::{DEFAULT_ALPHA, Recommender, ScoredMovie, blend, blend_scores, rank, resolve_title};
pub use correlation::{correlate_column, correlation_matrix};
pub use error::{Result, SimilarityError};
pub use genre::GenreMatrixBuilder;
pub use interaction::{InteractionMatrixBuilder, MovieRatingStats, movie_rating_stats};
pub use matrix::{LabeledMatrix, SimilarityMatrix};
pub use traits::MatrixBuilder;
