//! Parser for MovieLens CSV files.
//!
//! This module handles parsing the four files of the `ml-latest-small` release:
//! - ratings.csv: userId,movieId,rating,timestamp
//! - movies.csv: movieId,title,genres
//! - links.csv: movieId,imdbId,tmdbId
//! - tags.csv: userId,movieId,tag,timestamp
//!
//! Titles and tags may be quoted and contain commas, so records go through the
//! `csv` crate and serde instead of a hand-written splitter. Each file has a
//! private `Raw*` record that mirrors the column layout; the public functions
//! convert those into domain types (epoch seconds become `DateTime<Utc>`,
//! pipe-joined genres become a list).

use crate::error::{DataLoadError, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Separator between genre labels in movies.csv
pub const GENRE_SEPARATOR: char = '|';

#[derive(Debug, Deserialize)]
struct RawRating {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct RawMovie {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    genres: String,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    #[serde(rename = "imdbId")]
    imdb_id: u32,
    #[serde(rename = "tmdbId")]
    tmdb_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    tag: String,
    timestamp: i64,
}

/// Read every record of a headered CSV file into `T`.
///
/// Returns the records paired with their 1-based record number so callers
/// can report where a semantically bad value came from.
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<(usize, T)>> {
    let file = file_name(path);
    let mut reader = csv::Reader::from_path(path).map_err(|source| DataLoadError::CsvError {
        file: file.clone(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, record) in reader.deserialize::<T>().enumerate() {
        let record = record.map_err(|source| DataLoadError::CsvError {
            file: file.clone(),
            source,
        })?;
        records.push((idx + 1, record));
    }
    Ok(records)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convert seconds since the Unix epoch into a UTC timestamp
fn timestamp_from_epoch(secs: i64, file: &str, record: usize) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        record,
        reason: format!("Timestamp out of range: {}", secs),
    })
}

/// Parse the ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = file_name(path);
    read_records::<RawRating>(path)?
        .into_iter()
        .map(|(record, raw)| {
            Ok(Rating {
                user_id: raw.user_id,
                movie_id: raw.movie_id,
                rating: raw.rating,
                timestamp: timestamp_from_epoch(raw.timestamp, &file, record)?,
            })
        })
        .collect()
}

/// Parse the movies.csv file
///
/// The title often includes year in parentheses: "Toy Story (1995)"
/// Genres are pipe-separated: "Adventure|Animation|Children|Comedy|Fantasy"
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = file_name(path);
    read_records::<RawMovie>(path)?
        .into_iter()
        .map(|(record, raw)| {
            let genres = split_genres(&raw.genres);
            if genres.is_empty() {
                return Err(DataLoadError::ParseError {
                    file: file.clone(),
                    record,
                    reason: format!("Movie {} has an empty genre list", raw.movie_id),
                });
            }
            Ok(Movie {
                id: raw.movie_id,
                year: extract_year_from_title(&raw.title),
                title: raw.title,
                genres,
            })
        })
        .collect()
}

/// Parse the links.csv file
pub fn parse_links(path: &Path) -> Result<Vec<Link>> {
    Ok(read_records::<RawLink>(path)?
        .into_iter()
        .map(|(_, raw)| Link {
            movie_id: raw.movie_id,
            imdb_id: raw.imdb_id,
            tmdb_id: raw.tmdb_id,
        })
        .collect())
}

/// Parse the tags.csv file
pub fn parse_tags(path: &Path) -> Result<Vec<Tag>> {
    let file = file_name(path);
    read_records::<RawTag>(path)?
        .into_iter()
        .map(|(record, raw)| {
            Ok(Tag {
                user_id: raw.user_id,
                movie_id: raw.movie_id,
                tag: raw.tag,
                timestamp: timestamp_from_epoch(raw.timestamp, &file, record)?,
            })
        })
        .collect()
}

/// Split a pipe-joined genre field into its labels.
///
/// Blank labels are dropped and repeated labels are kept once, in first-seen
/// order, so a movie is associated with each of its genres exactly once.
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
pub fn split_genres(s: &str) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for genre in s.split(GENRE_SEPARATOR).map(str::trim) {
        if !genre.is_empty() && !genres.iter().any(|g| g == genre) {
            genres.push(genre.to_string());
        }
    }
    genres
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    // Some titles carry trailing whitespace after the year
    let title = title.trim_end();
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end && end == title.len() - 1 {
        let year_str = &title[start + 1..end];
        if let Ok(year) = year_str.parse::<u16>() {
            return Some(year);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_title("Toy Story (1995)"), Some(1995));
        assert_eq!(extract_year_from_title("Babylon 5 (1994) "), Some(1994));
        assert_eq!(extract_year_from_title("Movie Title"), None);
        assert_eq!(extract_year_from_title("(500) Days of Summer"), None);
    }

    #[test]
    fn test_split_genres() {
        assert_eq!(
            split_genres("Action|Adventure|Sci-Fi"),
            vec!["Action", "Adventure", "Sci-Fi"]
        );
        assert_eq!(split_genres("(no genres listed)"), vec!["(no genres listed)"]);
        assert_eq!(split_genres("Drama||Drama"), vec!["Drama"]);
        assert!(split_genres("").is_empty());
    }

    #[test]
    fn test_parse_ratings_normalizes_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,1,4.0,964982703\n1,3,4.5,964981247\n",
        );

        let ratings = parse_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[1].rating, 4.5);
        assert_eq!(ratings[0].timestamp.timestamp(), 964982703);
        assert_eq!(
            ratings[0].timestamp.format("%Y-%m-%d").to_string(),
            "2000-07-30"
        );
    }

    #[test]
    fn test_parse_movies_handles_quoted_titles() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "movies.csv",
            "movieId,title,genres\n\
             1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
             11,\"American President, The (1995)\",Comedy|Drama|Romance\n",
        );

        let movies = parse_movies(&path).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "American President, The (1995)");
        assert_eq!(movies[1].year, Some(1995));
        assert_eq!(movies[1].genres, vec!["Comedy", "Drama", "Romance"]);
    }

    #[test]
    fn test_parse_links_allows_missing_tmdb_id() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "links.csv",
            "movieId,imdbId,tmdbId\n1,0114709,862\n791,0113610,\n",
        );

        let links = parse_links(&path).unwrap();
        assert_eq!(links[0].imdb_id, 114709);
        assert_eq!(links[0].tmdb_id, Some(862));
        assert_eq!(links[1].tmdb_id, None);
    }

    #[test]
    fn test_parse_tags() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tags.csv",
            "userId,movieId,tag,timestamp\n2,60756,\"funny, smart\",1445714994\n",
        );

        let tags = parse_tags(&path).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag, "funny, smart");
        assert_eq!(tags[0].timestamp.timestamp(), 1445714994);
    }

    #[test]
    fn test_parse_ratings_reports_bad_column() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,abc,4.0,964982703\n",
        );

        let err = parse_ratings(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::CsvError { ref file, .. } if file == "ratings.csv"));
    }
}
