//! Dense matrices with labelled axes.
//!
//! [`LabeledMatrix`] is the substrate both builders produce: rows are users
//! (interaction matrix) or genre labels (genre matrix), columns are always
//! movie ids. Values are an `ndarray` laid out column-major (Fortran order)
//! because every consumer walks whole columns.
//!
//! [`SimilarityMatrix`] is the square movie x movie output of the
//! correlation engine. NaN marks an undefined coefficient.

use crate::error::{Result, SimilarityError};
use data_loader::MovieId;
use ndarray::{Array2, ArrayView1, ArrayView2, ShapeBuilder, Zip};

/// Dense `f64` matrix whose rows are labelled by `R` and whose columns are
/// labelled by movie id. Both label lists are sorted ascending and unique.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix<R> {
    rows: Vec<R>,
    columns: Vec<MovieId>,
    values: Array2<f64>,
}

impl<R: Ord> LabeledMatrix<R> {
    /// All-zero matrix with the given (sorted, unique) labels
    pub fn zeros(rows: Vec<R>, columns: Vec<MovieId>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(columns.windows(2).all(|w| w[0] < w[1]));
        let values = Array2::zeros((rows.len(), columns.len()).f());
        Self {
            rows,
            columns,
            values,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn columns(&self) -> &[MovieId] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw `rows x columns` values
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Position of a movie among the columns
    pub fn column_index(&self, movie_id: MovieId) -> Option<usize> {
        self.columns.binary_search(&movie_id).ok()
    }

    /// Position of a row label
    pub fn row_index(&self, row: &R) -> Option<usize> {
        self.rows.binary_search(row).ok()
    }

    /// Values of the `j`-th column, top to bottom
    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    /// Value at (row label, movie id), `None` if either label is unknown
    pub fn get(&self, row: &R, movie_id: MovieId) -> Option<f64> {
        let i = self.row_index(row)?;
        let j = self.column_index(movie_id)?;
        Some(self.values[[i, j]])
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[[i, j]] = value;
    }
}

/// Square, symmetric movie x movie matrix of correlation coefficients.
///
/// Both axes are labelled by `ids`. A NaN cell means the coefficient is
/// undefined (one of the columns had zero variance).
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    ids: Vec<MovieId>,
    values: Array2<f64>,
}

impl SimilarityMatrix {
    pub(crate) fn new(ids: Vec<MovieId>, values: Array2<f64>) -> Self {
        debug_assert_eq!(values.dim(), (ids.len(), ids.len()));
        Self { ids, values }
    }

    /// Movie ids labelling both axes, ascending
    pub fn ids(&self) -> &[MovieId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The raw coefficients, row and column order both following `ids`
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    fn index(&self, movie_id: MovieId) -> Result<usize> {
        self.ids
            .binary_search(&movie_id)
            .map_err(|_| SimilarityError::MovieNotInMatrix(movie_id))
    }

    /// Coefficient between two movies (may be NaN)
    pub fn get(&self, a: MovieId, b: MovieId) -> Result<f64> {
        let i = self.index(a)?;
        let j = self.index(b)?;
        Ok(self.values[[i, j]])
    }

    /// Every movie paired with its coefficient against `movie_id`,
    /// in id order (the query movie included)
    pub fn column(&self, movie_id: MovieId) -> Result<Vec<(MovieId, f64)>> {
        let j = self.index(movie_id)?;
        Ok(self
            .ids
            .iter()
            .copied()
            .zip(self.values.column(j).iter().copied())
            .collect())
    }

    /// Replace every undefined coefficient with `value`
    pub fn fill_undefined(mut self, value: f64) -> Self {
        self.values.mapv_inplace(|v| if v.is_nan() { value } else { v });
        self
    }

    /// Cell-wise combination of two matrices over the same ids
    pub(crate) fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        if self.ids != other.ids {
            return Err(SimilarityError::ShapeMismatch(format!(
                "{} movies vs {} movies",
                self.ids.len(),
                other.ids.len()
            )));
        }
        let values = Zip::from(&self.values)
            .and(&other.values)
            .map_collect(|&a, &b| f(a, b));
        Ok(Self::new(self.ids.clone(), values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_labeled_matrix_is_column_major() {
        let mut m = LabeledMatrix::zeros(vec![1u32, 2, 3], vec![10, 20]);
        m.set(0, 1, 4.0);
        m.set(2, 1, -1.5);

        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.column(0), array![0.0, 0.0, 0.0]);
        assert_eq!(m.column(1), array![4.0, 0.0, -1.5]);
        assert_eq!(m.values().dim(), (3, 2));
        assert_eq!(m.column(1).as_slice(), Some(&[4.0, 0.0, -1.5][..]));
        assert_eq!(m.get(&3, 20), Some(-1.5));
        assert_eq!(m.get(&4, 20), None);
        assert_eq!(m.column_index(30), None);
    }

    #[test]
    fn test_similarity_lookup_and_fill() {
        let m = SimilarityMatrix::new(vec![5, 9], array![[1.0, f64::NAN], [f64::NAN, f64::NAN]]);
        assert!(m.get(5, 9).unwrap().is_nan());
        assert_eq!(
            m.get(5, 7).unwrap_err(),
            SimilarityError::MovieNotInMatrix(7)
        );

        let filled = m.fill_undefined(0.0);
        assert_eq!(filled.get(5, 9).unwrap(), 0.0);
        assert_eq!(filled.column(5).unwrap(), vec![(5, 1.0), (9, 0.0)]);
    }

    #[test]
    fn test_zip_with_requires_same_ids() {
        let a = SimilarityMatrix::new(vec![1], array![[1.0]]);
        let b = SimilarityMatrix::new(vec![2], array![[1.0]]);
        assert!(matches!(
            a.zip_with(&b, |x, _| x),
            Err(SimilarityError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_zip_with_combines_cells() {
        let a = SimilarityMatrix::new(vec![1, 2], array![[1.0, 0.5], [0.5, 1.0]]);
        let b = SimilarityMatrix::new(vec![1, 2], array![[1.0, f64::NAN], [f64::NAN, 1.0]]);
        let sum = a.zip_with(&b, |x, y| x + y).unwrap();
        assert_eq!(sum.get(1, 1).unwrap(), 2.0);
        assert!(sum.get(1, 2).unwrap().is_nan());
        assert_eq!(sum.ids(), &[1, 2]);
    }
}
