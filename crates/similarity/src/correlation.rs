//! Correlation engine.
//!
//! Pearson correlation between the movie columns of a [`LabeledMatrix`].
//! Matrices here are dense (missing ratings were already filled), so every
//! row takes part in every pair.
//!
//! Zero-variance columns give NaN. Whether NaN is replaced is the caller's
//! choice: the rating signal fills it with 0, the genre signal keeps it.

use crate::error::{Result, SimilarityError};
use crate::matrix::{LabeledMatrix, SimilarityMatrix};
use crate::stats::{CenteredColumn, pearson};
use data_loader::MovieId;
use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::debug;

fn centered_columns<R: Ord + Sync>(matrix: &LabeledMatrix<R>) -> Vec<CenteredColumn> {
    (0..matrix.n_cols())
        .into_par_iter()
        .map(|j| CenteredColumn::new(matrix.column(j)))
        .collect()
}

/// Coefficient of a column with itself: exactly 1, or NaN without variance
fn self_correlation(column: &CenteredColumn) -> f64 {
    if column.has_zero_variance() {
        f64::NAN
    } else {
        1.0
    }
}

/// Full movie x movie Pearson matrix of `matrix`'s columns.
///
/// The result is exactly symmetric and its diagonal is exactly 1 for every
/// column with nonzero variance. Quadratic in the number of movies; prefer
/// [`correlate_column`] when only one movie is queried.
pub fn correlation_matrix<R: Ord + Sync>(matrix: &LabeledMatrix<R>) -> SimilarityMatrix {
    let centered = centered_columns(matrix);
    let n = centered.len();
    let mut values = Array2::<f64>::zeros((n, n));
    Zip::indexed(&mut values).par_for_each(|(i, j), cell| {
        *cell = if i == j {
            self_correlation(&centered[i])
        } else {
            pearson(&centered[i], &centered[j])
        };
    });

    debug!("Computed {}x{} correlation matrix", n, n);
    SimilarityMatrix::new(matrix.columns().to_vec(), values)
}

/// Correlation of one movie's column against every column, in column
/// order. Values are identical to the matching column of
/// [`correlation_matrix`].
pub fn correlate_column<R: Ord + Sync>(
    matrix: &LabeledMatrix<R>,
    movie_id: MovieId,
) -> Result<Vec<(MovieId, f64)>> {
    let q = matrix
        .column_index(movie_id)
        .ok_or(SimilarityError::MovieNotInMatrix(movie_id))?;
    let query = CenteredColumn::new(matrix.column(q));

    let scores = matrix
        .columns()
        .par_iter()
        .enumerate()
        .map(|(j, &id)| {
            let score = if j == q {
                self_correlation(&query)
            } else {
                // Same operand order as the full matrix (row j, column q)
                pearson(&CenteredColumn::new(matrix.column(j)), &query)
            };
            (id, score)
        })
        .collect();
    Ok(scores)
}
