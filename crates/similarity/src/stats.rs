//! Small statistics helpers shared by the matrix builders and the
//! correlation engine.

use ndarray::{Array1, ArrayView1};

/// Pseudo-count added to the number of ratings when damping a movie's mean.
pub const DAMPING_PRIOR: f64 = 4.0;

/// Shrink a movie's mean rating toward zero in proportion to how few
/// ratings it has: `n * mean / (n + 4)`.
///
/// A movie with a single 5-star rating gets a baseline of 1.0; with 96
/// ratings averaging 5.0 the baseline is 4.8.
pub fn damped_mean(num_ratings: usize, mean_rating: f64) -> f64 {
    let n = num_ratings as f64;
    n * mean_rating / (n + DAMPING_PRIOR)
}

/// A column with its mean removed, ready for repeated Pearson products.
#[derive(Debug, Clone, PartialEq)]
pub struct CenteredColumn {
    values: Array1<f64>,
    norm: f64,
    constant: bool,
}

impl CenteredColumn {
    /// Center `column` on its mean.
    ///
    /// Constancy is checked on the raw values rather than on the centered
    /// sum of squares, which rounding can leave slightly above zero.
    pub fn new(column: ArrayView1<'_, f64>) -> Self {
        let constant = match column.first() {
            Some(&first) => column.iter().all(|&v| v == first),
            None => true,
        };
        let values = &column - column.mean().unwrap_or(0.0);
        let norm = values.dot(&values).sqrt();
        Self {
            values,
            norm,
            constant,
        }
    }

    /// True when every value is equal (including empty and single-row
    /// columns), i.e. the variance is zero
    pub fn has_zero_variance(&self) -> bool {
        self.constant
    }
}

/// Pearson correlation of two centered columns of equal length.
///
/// Returns NaN when either column has zero variance; otherwise the result is
/// clamped to `[-1, 1]` to absorb rounding.
pub fn pearson(a: &CenteredColumn, b: &CenteredColumn) -> f64 {
    debug_assert_eq!(a.values.len(), b.values.len());
    if a.constant || b.constant {
        return f64::NAN;
    }
    (a.values.dot(&b.values) / (a.norm * b.norm)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered(values: &[f64]) -> CenteredColumn {
        CenteredColumn::new(ArrayView1::from(values))
    }

    fn corr(x: &[f64], y: &[f64]) -> f64 {
        pearson(&centered(x), &centered(y))
    }

    #[test]
    fn test_centering_removes_the_mean() {
        let column = centered(&[1.0, 2.0, 6.0]);
        assert_eq!(column.values.to_vec(), vec![-2.0, -1.0, 3.0]);
        assert!((column.norm - 14f64.sqrt()).abs() < 1e-12);
        assert!(!column.has_zero_variance());
    }

    #[test]
    fn test_damped_mean_examples() {
        assert_eq!(damped_mean(1, 5.0), 1.0);
        assert!((damped_mean(96, 5.0) - 4.8).abs() < 1e-12);
        assert_eq!(damped_mean(0, 0.0), 0.0);
    }

    #[test]
    fn test_damped_mean_approaches_mean_as_count_grows() {
        let mut previous = 0.0;
        for n in 1..500 {
            let damped = damped_mean(n, 4.0);
            assert!(damped > previous, "damped mean must grow with n");
            assert!(damped < 4.0, "damped mean stays below the raw mean");
            previous = damped;
        }
        assert!(4.0 - previous < 0.05);
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        assert!((corr(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((corr(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_known_value() {
        // x = [1, 2, 3, 4], y = [1, 3, 2, 4] -> r = 0.8
        let r = corr(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]);
        assert!((r - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        assert!(corr(&[0.0, 0.0], &[0.0, 0.0]).is_nan());
        assert!(corr(&[0.1, 0.1, 0.1], &[1.0, 2.0, 3.0]).is_nan());
        assert!(corr(&[1.0], &[2.0]).is_nan());
        assert!(centered(&[]).has_zero_variance());
    }

    #[test]
    fn test_pearson_is_symmetric() {
        let a = centered(&[0.3, -1.2, 4.4, 0.0, 2.5]);
        let b = centered(&[1.1, 0.7, -0.2, 3.3, 0.0]);
        assert_eq!(pearson(&a, &b), pearson(&b, &a));
    }
}
