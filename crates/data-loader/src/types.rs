//! Domain types for the four `ml-latest-small` tables.
//!
//! `movies.csv`, `ratings.csv`, `links.csv` and `tags.csv` each map to one
//! struct here. [`DataIndex`] owns all of them; [`UserMovieRating`] is the
//! borrowed row type of the ratings/movies join that the similarity core
//! consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie inside the MovieLens dataset
pub type MovieId = u32;

// =============================================================================
// Catalogue Tables
// =============================================================================

/// One row of `movies.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Genre labels in the order the dataset lists them.
    ///
    /// Kept as strings: the latest MovieLens releases add labels such as
    /// "IMAX" and "(no genres listed)" that a closed enum would reject.
    pub genres: Vec<String>,
}

/// Mapping from a MovieLens id to the ids used by external movie databases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub movie_id: MovieId,
    /// Numeric part of the IMDb id (`tt0114709` -> 114709)
    pub imdb_id: u32,
    /// Some movies have no TMDB entry
    pub tmdb_id: Option<u32>,
}

/// Free-text tag a user attached to a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub tag: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Ratings
// =============================================================================

/// One row of `ratings.csv`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value on the half-star scale 0.5 to 5.0
    pub rating: f32,
    /// When the rating was made (normalized from epoch seconds)
    pub timestamp: DateTime<Utc>,
}

/// One row of the ratings table joined with the movies table on `movie_id`.
///
/// Rust concept: the lifetime `'a` ties the borrowed title and genres to the
/// `DataIndex` that owns them, so joining never copies strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserMovieRating<'a> {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
    pub timestamp: DateTime<Utc>,
    pub title: &'a str,
    pub genres: &'a [String],
}

/// Average and count of a movie's raw ratings, filled in after loading.
/// Used for search ordering and display only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
}

// =============================================================================
// DataIndex
// =============================================================================

/// In-memory snapshot of the dataset with lookups by movie and user.
///
/// Movies and links are keyed by movie id. Ratings are kept in file order
/// and also grouped per user and per movie.
#[derive(Debug)]
pub struct DataIndex {
    pub(crate) movies: HashMap<MovieId, Movie>,
    pub(crate) links: HashMap<MovieId, Link>,
    pub(crate) tags: Vec<Tag>,
    /// Every rating in file order; the joined table follows this order
    pub(crate) ratings: Vec<Rating>,

    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,
    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            movies: HashMap::new(),
            links: HashMap::new(),
            tags: Vec::new(),
            ratings: Vec::new(),
            user_ratings: HashMap::new(),
            movie_ratings: HashMap::new(),
            movie_stats: HashMap::new(),
        }
    }

    /// Movie row by MovieLens id
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Get the external-id link for a movie
    pub fn get_link(&self, movie_id: MovieId) -> Option<&Link> {
        self.links.get(&movie_id)
    }

    /// Ratings by one user, in file order
    ///
    /// Returns an empty slice if user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Ratings of one movie, in file order
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get precomputed statistics for a movie
    pub fn get_movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.movie_stats.get(&movie_id)
    }

    /// All ratings in the order they were loaded
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// All tags in the order they were loaded
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// All movie ids, sorted ascending
    pub fn get_all_movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.movies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Titles of every movie that has at least one rating, sorted and
    /// deduplicated. These are the titles a recommendation can be asked for.
    pub fn rated_movie_titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = self
            .movie_ratings
            .keys()
            .filter_map(|id| self.movies.get(id))
            .map(|m| m.title.as_str())
            .collect();
        titles.sort_unstable();
        titles.dedup();
        titles
    }

    /// Inner join of ratings and movies on `movie_id`.
    ///
    /// Ratings whose movie is unknown are dropped, exactly like a SQL inner
    /// join. Row order follows the ratings table.
    pub fn join_ratings(&self) -> Vec<UserMovieRating<'_>> {
        self.ratings
            .iter()
            .filter_map(|r| {
                let movie = self.movies.get(&r.movie_id)?;
                Some(UserMovieRating {
                    user_id: r.user_id,
                    movie_id: r.movie_id,
                    rating: r.rating,
                    timestamp: r.timestamp,
                    title: &movie.title,
                    genres: &movie.genres,
                })
            })
            .collect()
    }

    /// Stable identity of the rating and movie content.
    ///
    /// Two indices holding the same ratings (in the same order) and the same
    /// movies have the same fingerprint; derived matrices are cached under it.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.ratings.len().hash(&mut hasher);
        for r in &self.ratings {
            r.user_id.hash(&mut hasher);
            r.movie_id.hash(&mut hasher);
            r.rating.to_bits().hash(&mut hasher);
            r.timestamp.timestamp().hash(&mut hasher);
        }
        for id in self.get_all_movie_ids() {
            if let Some(movie) = self.movies.get(&id) {
                movie.id.hash(&mut hasher);
                movie.title.hash(&mut hasher);
                movie.genres.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// Insert a movie into the index
    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    /// Insert a link into the index
    pub fn insert_link(&mut self, link: Link) {
        self.links.insert(link.movie_id, link);
    }

    /// Insert a tag into the index
    pub fn insert_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    /// Append a rating to the table and both per-key groupings
    pub fn insert_rating(&mut self, rating: Rating) {
        self.ratings.push(rating);
        self.user_ratings.entry(rating.user_id).or_default().push(rating);
        self.movie_ratings.entry(rating.movie_id).or_default().push(rating);
    }

    /// Get counts for debugging/validation: (movies, ratings, links, tags)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.movies.len(),
            self.ratings.len(),
            self.links.len(),
            self.tags.len(),
        )
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
