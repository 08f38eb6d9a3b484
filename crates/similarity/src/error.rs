//! Errors raised by the similarity pipeline.

use data_loader::{MovieId, UserId};
use thiserror::Error;

/// Errors that can occur while building matrices or ranking recommendations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// The query title matches no movie in the joined rating table.
    /// Recoverable: the caller may ask for another title.
    #[error("No rated movie is titled '{0}'")]
    TitleNotFound(String),

    /// A user rated the same movie twice, so the interaction matrix would
    /// need two values in one cell
    #[error("Duplicate rating for user {user_id} and movie {movie_id}")]
    DuplicateRating { user_id: UserId, movie_id: MovieId },

    /// A movie id was looked up in a matrix that has no column for it
    #[error("Movie {0} is not a column of the matrix")]
    MovieNotInMatrix(MovieId),

    /// Two matrices that must share their movie ids do not
    #[error("Similarity matrices are not aligned: {0}")]
    ShapeMismatch(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SimilarityError>;
