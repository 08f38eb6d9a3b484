//! Core trait for the matrix builders.
//!
//! Each similarity signal starts from the same joined user-rating-movie
//! table and turns it into a dense matrix whose columns are movie ids. The
//! correlation engine only ever sees the matrix, so new signals plug in by
//! implementing [`MatrixBuilder`].

use crate::error::Result;
use crate::matrix::LabeledMatrix;
use data_loader::UserMovieRating;

/// Turns the joined rating table into a movie-column matrix.
///
/// `Send + Sync` lets builders run inside `spawn_blocking` and rayon tasks.
pub trait MatrixBuilder: Send + Sync {
    /// Row label type (user id, genre label, ...)
    type Row: Ord + Clone + Send + Sync;

    /// Returns the name of this builder (for logging/debugging)
    fn name(&self) -> &str;

    /// Build the matrix. Columns are the distinct movie ids of `table`,
    /// ascending.
    fn build(&self, table: &[UserMovieRating<'_>]) -> Result<LabeledMatrix<Self::Row>>;
}
