//! Genre indicator matrix builder.
//!
//! Explodes each movie's genre list into (movie, genre) pairs and pivots
//! them into a genres x movies matrix of 0/1 indicators. Movies are the
//! columns so the correlation engine compares movies with movies.

use crate::error::Result;
use crate::matrix::LabeledMatrix;
use crate::traits::MatrixBuilder;
use data_loader::{MovieId, UserMovieRating};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Builds the genres x movies indicator matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct GenreMatrixBuilder;

impl MatrixBuilder for GenreMatrixBuilder {
    type Row = String;

    fn name(&self) -> &str {
        "GenreMatrixBuilder"
    }

    fn build(&self, table: &[UserMovieRating<'_>]) -> Result<LabeledMatrix<String>> {
        // One genre list per movie; every row of a movie carries the same list
        let mut movie_genres: BTreeMap<MovieId, &[String]> = BTreeMap::new();
        for row in table {
            movie_genres.entry(row.movie_id).or_insert(row.genres);
        }

        let genres: Vec<String> = movie_genres
            .values()
            .flat_map(|genres| genres.iter())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        let movies: Vec<MovieId> = movie_genres.keys().copied().collect();

        let mut matrix = LabeledMatrix::zeros(genres, movies);
        for (j, genres) in movie_genres.values().enumerate() {
            for genre in genres.iter() {
                if let Some(i) = matrix.row_index(genre) {
                    matrix.set(i, j, 1.0);
                }
            }
        }

        debug!(
            "Built genre matrix: {} genres x {} movies",
            matrix.n_rows(),
            matrix.n_cols()
        );
        Ok(matrix)
    }
}
