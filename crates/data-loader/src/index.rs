//! DataIndex building and indexing logic.
//!
//! This module builds the DataIndex from parsed data:
//! - Create primary indices (movies, links, tags, ratings)
//! - Compute aggregate statistics (movie stats)
//! - Validate referential integrity
//! - Answer catalogue queries (title search)

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Lowest and highest value on the MovieLens half-star scale
pub const RATING_RANGE: (f32, f32) = (0.5, 5.0);

impl DataIndex {
    /// Load the entire MovieLens dataset from a directory
    ///
    /// This is the main entry point for loading data.
    ///
    /// Steps:
    /// 1. Parse all four files (ratings, movies, links, tags) in parallel
    /// 2. Build primary indices
    /// 3. Compute movie statistics
    /// 4. Validate data integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading MovieLens dataset from {:?}", data_dir);

        let ratings_path = data_dir.join("ratings.csv");
        let movies_path = data_dir.join("movies.csv");
        let links_path = data_dir.join("links.csv");
        let tags_path = data_dir.join("tags.csv");

        // Rayon's `join` runs two closures in parallel; nesting gives
        // four-way parallelism
        let ((ratings, movies), (links, tags)) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_ratings(&ratings_path),
                    || parser::parse_movies(&movies_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_links(&links_path),
                    || parser::parse_tags(&tags_path),
                )
            },
        );

        let ratings = ratings?;
        let movies = movies?;
        let links = links?;
        let tags = tags?;

        info!(
            "Loaded {} movies, {} ratings, {} links, {} tags",
            movies.len(),
            ratings.len(),
            links.len(),
            tags.len()
        );

        let mut index = DataIndex::new();

        // Movie ids must be unique; check before the HashMap silently
        // overwrites a duplicate
        let mut seen = HashSet::with_capacity(movies.len());
        for movie in movies {
            if !seen.insert(movie.id) {
                return Err(DataLoadError::ValidationError(format!(
                    "Duplicate movie id {}",
                    movie.id
                )));
            }
            index.insert_movie(movie);
        }

        // One link per movie
        let mut linked = HashSet::with_capacity(links.len());
        for link in links {
            if !linked.insert(link.movie_id) {
                return Err(DataLoadError::ValidationError(format!(
                    "Duplicate link for movie id {}",
                    link.movie_id
                )));
            }
            index.insert_link(link);
        }

        for tag in tags {
            index.insert_tag(tag);
        }

        // Insert all ratings (this also populates user_ratings and movie_ratings)
        for rating in ratings {
            index.insert_rating(rating);
        }

        index.compute_movie_stats();
        index.validate()?;

        info!("DataIndex successfully built and validated");
        Ok(index)
    }

    /// Compute count and average rating for every rated movie
    pub fn compute_movie_stats(&mut self) {
        let movie_stats = self
            .movie_ratings
            .par_iter()
            .map(|(&movie_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.rating).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };

                (
                    movie_id,
                    MovieStats {
                        avg_rating,
                        rating_count,
                    },
                )
            })
            .collect();
        self.movie_stats = movie_stats;
        debug!("Computed stats for {} movies", self.movie_stats.len());
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - All rating, link and tag movie ids exist in movies
    /// - Ratings are on the half-star scale (0.5 - 5.0)
    ///
    /// Returns Ok(()) if valid, Err on the first issue found
    pub fn validate(&self) -> Result<()> {
        let (min, max) = RATING_RANGE;
        for rating in &self.ratings {
            if !self.movies.contains_key(&rating.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id,
                });
            }
            if !(min..=max).contains(&rating.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }

        for movie_id in self.links.keys() {
            if !self.movies.contains_key(movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: *movie_id,
                });
            }
        }

        for tag in &self.tags {
            if !self.movies.contains_key(&tag.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: tag.movie_id,
                });
            }
        }
        Ok(())
    }

    /// Search the catalogue by title (case-insensitive).
    ///
    /// Exact matches come first, then substring matches; within each group
    /// movies are ordered by average rating, highest first, then by id.
    pub fn search_titles(&self, query: &str) -> Vec<&Movie> {
        let query = query.to_lowercase();
        let mut matches: Vec<(u8, f32, &Movie)> = self
            .movies
            .values()
            .filter_map(|movie| {
                let title = movie.title.to_lowercase();
                let rank = if title == query {
                    0
                } else if title.contains(&query) {
                    1
                } else {
                    return None;
                };
                let avg = self
                    .get_movie_stats(movie.id)
                    .map(|s| s.avg_rating)
                    .unwrap_or(0.0);
                Some((rank, avg, movie))
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        matches.into_iter().map(|(_, _, movie)| movie).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(dir: &Path, ratings: &str) {
        fs::write(
            dir.join("movies.csv"),
            "movieId,title,genres\n\
             1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
             2,Jumanji (1995),Adventure|Children|Fantasy\n\
             3,Grumpier Old Men (1995),Comedy|Romance\n",
        )
        .unwrap();
        fs::write(
            dir.join("links.csv"),
            "movieId,imdbId,tmdbId\n1,0114709,862\n2,0113497,8844\n3,0113228,15602\n",
        )
        .unwrap();
        fs::write(
            dir.join("tags.csv"),
            "userId,movieId,tag,timestamp\n2,1,pixar,1445714994\n",
        )
        .unwrap();
        fs::write(dir.join("ratings.csv"), ratings).unwrap();
    }

    #[test]
    fn test_load_dataset_from_csv() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            dir.path(),
            concat!(
                "userId,movieId,rating,timestamp\n",
                "1,1,4.0,964982703\n",
                "1,3,4.5,964981247\n",
                "2,1,3.0,964982224\n",
            ),
        );

        let index = DataIndex::load_from_files(dir.path()).unwrap();
        assert_eq!(index.counts(), (3, 3, 3, 1));
        assert_eq!(index.get_link(1).unwrap().imdb_id, 114709);
        assert_eq!(index.get_user_ratings(1).len(), 2);

        let stats = index.get_movie_stats(1).unwrap();
        assert_eq!(stats.rating_count, 2);
        assert_eq!(stats.avg_rating, 3.5);
        assert!(index.get_movie_stats(2).is_none());
    }

    #[test]
    fn test_load_rejects_unknown_movie() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            dir.path(),
            "userId,movieId,rating,timestamp\n1,99,4.0,964982703\n",
        );

        let err = DataIndex::load_from_files(dir.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingReference { id: 99, .. }));
    }

    #[test]
    fn test_load_rejects_out_of_range_rating() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            dir.path(),
            "userId,movieId,rating,timestamp\n1,1,6.0,964982703\n",
        );

        let err = DataIndex::load_from_files(dir.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { .. }));
    }

    #[test]
    fn test_load_rejects_duplicate_link() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            dir.path(),
            "userId,movieId,rating,timestamp\n1,1,4.0,964982703\n",
        );
        fs::write(
            dir.path().join("links.csv"),
            "movieId,imdbId,tmdbId\n1,0114709,862\n2,0113497,8844\n1,0113228,15602\n",
        )
        .unwrap();

        let err = DataIndex::load_from_files(dir.path()).unwrap_err();
        match err {
            DataLoadError::ValidationError(message) => {
                assert_eq!(message, "Duplicate link for movie id 1")
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_search_titles_ranks_exact_first() {
        let mut index = DataIndex::new();
        for (id, title) in [(1, "Alien (1979)"), (2, "Aliens (1986)"), (3, "Alien³ (1992)")] {
            index.insert_movie(Movie {
                id,
                title: title.to_string(),
                year: None,
                genres: vec!["Sci-Fi".to_string()],
            });
        }
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        index.insert_rating(Rating {
            user_id: 1,
            movie_id: 2,
            rating: 5.0,
            timestamp: ts,
        });
        index.insert_rating(Rating {
            user_id: 1,
            movie_id: 3,
            rating: 2.0,
            timestamp: ts,
        });
        index.compute_movie_stats();

        let results = index.search_titles("alien (1979)");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);

        let results: Vec<MovieId> = index.search_titles("alien").iter().map(|m| m.id).collect();
        assert_eq!(results, vec![2, 3, 1]);
    }
}
