//! Interaction (utility) matrix builder.
//!
//! ## Algorithm
//! 1. Per movie, count the ratings and take their mean
//! 2. Damp the mean toward zero: `n * mean / (n + 4)`
//! 3. Center each rating on its movie's damped mean
//! 4. Pivot into users x movies; pairs with no rating stay 0
//!
//! The 0 fill means "no deviation signal". It cannot tell "never watched"
//! apart from "rated exactly at the baseline".

use crate::error::{Result, SimilarityError};
use crate::matrix::LabeledMatrix;
use crate::stats::damped_mean;
use crate::traits::MatrixBuilder;
use data_loader::{MovieId, UserId, UserMovieRating};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Per-movie aggregates feeding the damped baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovieRatingStats {
    pub num_ratings: usize,
    pub mean_rating: f64,
    pub damped_mean_rating: f64,
}

/// Count, mean and damped mean of the ratings of every movie in `table`
pub fn movie_rating_stats(table: &[UserMovieRating<'_>]) -> BTreeMap<MovieId, MovieRatingStats> {
    let mut sums: BTreeMap<MovieId, (usize, f64)> = BTreeMap::new();
    for row in table {
        let entry = sums.entry(row.movie_id).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += f64::from(row.rating);
    }

    sums.into_iter()
        .map(|(movie_id, (num_ratings, total))| {
            let mean_rating = total / num_ratings as f64;
            let stats = MovieRatingStats {
                num_ratings,
                mean_rating,
                damped_mean_rating: damped_mean(num_ratings, mean_rating),
            };
            (movie_id, stats)
        })
        .collect()
}

/// Builds the users x movies matrix of mean-centered, damped ratings
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionMatrixBuilder;

impl MatrixBuilder for InteractionMatrixBuilder {
    type Row = UserId;

    fn name(&self) -> &str {
        "InteractionMatrixBuilder"
    }

    fn build(&self, table: &[UserMovieRating<'_>]) -> Result<LabeledMatrix<UserId>> {
        let stats = movie_rating_stats(table);
        let users: Vec<UserId> = table
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let movies: Vec<MovieId> = stats.keys().copied().collect();

        let mut matrix = LabeledMatrix::zeros(users, movies);
        let mut seen: HashSet<(UserId, MovieId)> = HashSet::with_capacity(table.len());

        for row in table {
            if !seen.insert((row.user_id, row.movie_id)) {
                return Err(SimilarityError::DuplicateRating {
                    user_id: row.user_id,
                    movie_id: row.movie_id,
                });
            }
            // Every label comes from `table`, so both lookups succeed
            let (Some(i), Some(j)) = (
                matrix.row_index(&row.user_id),
                matrix.column_index(row.movie_id),
            ) else {
                continue;
            };
            let baseline = stats[&row.movie_id].damped_mean_rating;
            matrix.set(i, j, f64::from(row.rating) - baseline);
        }

        debug!(
            "Built interaction matrix: {} users x {} movies",
            matrix.n_rows(),
            matrix.n_cols()
        );
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    fn row(user_id: UserId, movie_id: MovieId, rating: f32) -> UserMovieRating<'static> {
        UserMovieRating {
            user_id,
            movie_id,
            rating,
            timestamp: ts(),
            title: "",
            genres: &[],
        }
    }

    #[test]
    fn test_movie_rating_stats() {
        let table = vec![row(1, 10, 5.0), row(2, 10, 3.0), row(1, 20, 5.0)];
        let stats = movie_rating_stats(&table);

        assert_eq!(stats[&10].num_ratings, 2);
        assert_eq!(stats[&10].mean_rating, 4.0);
        assert!((stats[&10].damped_mean_rating - 8.0 / 6.0).abs() < 1e-12);
        assert_eq!(stats[&20].damped_mean_rating, 1.0);
    }

    #[test]
    fn test_shape_and_zero_fill() {
        let table = vec![row(3, 10, 4.0), row(1, 20, 2.0), row(3, 20, 5.0)];
        let m = InteractionMatrixBuilder.build(&table).unwrap();

        assert_eq!(m.rows(), &[1, 3]);
        assert_eq!(m.columns(), &[10, 20]);
        // user 1 never rated movie 10
        assert_eq!(m.get(&1, 10), Some(0.0));
    }

    #[test]
    fn test_cells_are_centered_on_damped_mean() {
        // movie 10: n = 2, mean = 4.5, damped = 1.5
        let table = vec![row(1, 10, 5.0), row(2, 10, 4.0)];
        let m = InteractionMatrixBuilder.build(&table).unwrap();

        assert_eq!(m.get(&1, 10), Some(3.5));
        assert_eq!(m.get(&2, 10), Some(2.5));
    }

    #[test]
    fn test_empty_table_gives_empty_matrix() {
        let m = InteractionMatrixBuilder.build(&[]).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.n_rows(), 0);
        assert_eq!(m.n_cols(), 0);
    }

    #[test]
    fn test_duplicate_pair_is_rejected() {
        let table = vec![row(1, 10, 5.0), row(1, 10, 4.0)];
        assert_eq!(
            InteractionMatrixBuilder.build(&table).unwrap_err(),
            SimilarityError::DuplicateRating {
                user_id: 1,
                movie_id: 10
            }
        );
    }
}
