//! Recommendation blender.
//!
//! Combines the rating-based and genre-based similarity signals and ranks
//! candidates for a query movie.
//!
//! ## Algorithm
//! 1. Resolve the query title to a movie id
//! 2. Build the interaction and genre matrices
//! 3. Correlate the query movie against every movie in both matrices;
//!    undefined rating correlations become 0
//! 4. Blend: `rating + alpha * (genre - rating)` (alpha = 0.2)
//! 5. Drop the query movie and sort by score, highest first

use crate::correlation::{correlate_column, correlation_matrix};
use crate::error::{Result, SimilarityError};
use crate::genre::GenreMatrixBuilder;
use crate::interaction::InteractionMatrixBuilder;
use crate::matrix::{LabeledMatrix, SimilarityMatrix};
use crate::traits::MatrixBuilder;
use data_loader::{MovieId, UserId, UserMovieRating};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

/// Weight of the genre signal relative to the rating signal
pub const DEFAULT_ALPHA: f64 = 0.2;

/// A candidate movie and its blended similarity to the query movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    /// Blended score; NaN when the genre correlation was undefined
    pub score: f64,
}

/// Linear interpolation from the rating score toward the genre score,
/// `rating + alpha * (genre - rating)`.
///
/// Evaluated as `(1 - alpha) * rating + alpha * genre` so that alpha 0 and
/// alpha 1 return the rating and genre score bit for bit.
pub fn blend_scores(rating: f64, genre: f64, alpha: f64) -> f64 {
    (1.0 - alpha) * rating + alpha * genre
}

/// Blend two full similarity matrices cell by cell
pub fn blend(
    rating: &SimilarityMatrix,
    genre: &SimilarityMatrix,
    alpha: f64,
) -> Result<SimilarityMatrix> {
    rating.zip_with(genre, |r, g| blend_scores(r, g, alpha))
}

/// Descending by score with NaN last
fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Rank `scores` highest first, leaving out `exclude`.
///
/// The sort is stable: equal scores keep their input order, so feeding
/// candidates in id order makes the ranking deterministic.
pub fn rank(
    scores: impl IntoIterator<Item = (MovieId, f64)>,
    exclude: MovieId,
) -> Vec<ScoredMovie> {
    let mut ranked: Vec<ScoredMovie> = scores
        .into_iter()
        .filter(|&(movie_id, _)| movie_id != exclude)
        .map(|(movie_id, score)| ScoredMovie { movie_id, score })
        .collect();
    ranked.sort_by(|a, b| descending_nan_last(a.score, b.score));
    ranked
}

/// Find the movie id carrying exactly `title` in the joined table.
///
/// Titles are assumed unique; if several ids share one, the smallest id
/// wins and a warning is logged.
pub fn resolve_title(table: &[UserMovieRating<'_>], title: &str) -> Result<MovieId> {
    let ids: BTreeSet<MovieId> = table
        .iter()
        .filter(|row| row.title == title)
        .map(|row| row.movie_id)
        .collect();

    let mut ids = ids.into_iter();
    let movie_id = ids
        .next()
        .ok_or_else(|| SimilarityError::TitleNotFound(title.to_string()))?;
    let others: Vec<MovieId> = ids.collect();
    if !others.is_empty() {
        warn!(
            "Title '{}' maps to several movies; using {} and ignoring {:?}",
            title, movie_id, others
        );
    }
    Ok(movie_id)
}

/// Blends collaborative and content similarity into a ranked list.
///
/// ## Usage
/// ```ignore
/// let recommender = Recommender::new();
/// let table = data_index.join_ratings();
/// let ranked = recommender.recommend("Toy Story (1995)", &table)?;
/// ```
#[derive(Debug, Clone)]
pub struct Recommender {
    alpha: f64,
    interaction: InteractionMatrixBuilder,
    genre: GenreMatrixBuilder,
}

impl Recommender {
    /// Recommender with the default blend weight (0.2)
    pub fn new() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            interaction: InteractionMatrixBuilder,
            genre: GenreMatrixBuilder,
        }
    }

    /// Override the blend weight: 0 keeps only the rating signal, 1 only
    /// the genre signal
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Build the interaction matrix from the joined table
    pub fn interaction_matrix(
        &self,
        table: &[UserMovieRating<'_>],
    ) -> Result<LabeledMatrix<UserId>> {
        debug!("Running {}", self.interaction.name());
        self.interaction.build(table)
    }

    /// Build the genre indicator matrix from the joined table
    pub fn genre_matrix(&self, table: &[UserMovieRating<'_>]) -> Result<LabeledMatrix<String>> {
        debug!("Running {}", self.genre.name());
        self.genre.build(table)
    }

    /// Full blended movie x movie matrix (rating NaNs filled with 0)
    pub fn blended_matrix(
        &self,
        interaction: &LabeledMatrix<UserId>,
        genre: &LabeledMatrix<String>,
    ) -> Result<SimilarityMatrix> {
        let rating_sim = correlation_matrix(interaction).fill_undefined(0.0);
        let genre_sim = correlation_matrix(genre);
        blend(&rating_sim, &genre_sim, self.alpha)
    }

    /// Resolve `title`, build both matrices and rank every other movie
    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn recommend(
        &self,
        title: &str,
        table: &[UserMovieRating<'_>],
    ) -> Result<Vec<ScoredMovie>> {
        let movie_id = resolve_title(table, title)?;
        let interaction = self.interaction_matrix(table)?;
        let genre = self.genre_matrix(table)?;
        self.recommend_for(movie_id, &interaction, &genre)
    }

    /// Rank every movie against `movie_id` using prebuilt matrices.
    ///
    /// Returns one entry per movie other than `movie_id`.
    pub fn recommend_for(
        &self,
        movie_id: MovieId,
        interaction: &LabeledMatrix<UserId>,
        genre: &LabeledMatrix<String>,
    ) -> Result<Vec<ScoredMovie>> {
        if interaction.columns() != genre.columns() {
            return Err(SimilarityError::ShapeMismatch(format!(
                "interaction matrix has {} movies, genre matrix has {}",
                interaction.n_cols(),
                genre.n_cols()
            )));
        }

        let rating_scores = correlate_column(interaction, movie_id)?;
        let genre_scores = correlate_column(genre, movie_id)?;

        let blended = rating_scores
            .into_iter()
            .zip(genre_scores)
            .map(|((id, rating), (_, genre))| {
                let rating = if rating.is_nan() { 0.0 } else { rating };
                (id, blend_scores(rating, genre, self.alpha))
            });

        let ranked = rank(blended, movie_id);
        debug!("Ranked {} candidates for movie {}", ranked.len(), movie_id);
        Ok(ranked)
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_scores_endpoints() {
        assert_eq!(blend_scores(0.3, 0.9, 0.0), 0.3);
        assert_eq!(blend_scores(0.3, 0.9, 1.0), 0.9);
        let mid = blend_scores(0.3, 0.9, DEFAULT_ALPHA);
        assert!(mid > 0.3 && mid < 0.9);
        assert!(blend_scores(0.3, f64::NAN, 0.2).is_nan());
    }

    #[test]
    fn test_rank_excludes_query_and_sorts_descending() {
        let ranked = rank(vec![(1, 0.2), (2, 1.0), (3, 0.9), (4, -0.5)], 2);
        let ids: Vec<MovieId> = ranked.iter().map(|s| s.movie_id).collect();
        assert_eq!(ids, vec![3, 1, 4]);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let ranked = rank(vec![(1, 0.5), (2, 0.7), (3, 0.5), (4, 0.5)], 99);
        let ids: Vec<MovieId> = ranked.iter().map(|s| s.movie_id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_rank_puts_nan_last() {
        let ranked = rank(vec![(1, f64::NAN), (2, -0.9), (3, 0.1)], 0);
        let ids: Vec<MovieId> = ranked.iter().map(|s| s.movie_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_recommender_alpha() {
        assert_eq!(Recommender::new().alpha(), DEFAULT_ALPHA);
        assert_eq!(Recommender::default().with_alpha(1.0).alpha(), 1.0);
    }
}
