//! Movie metadata client.
//!
//! Looks up display metadata (title, poster, plot, release date, runtime)
//! for a movie by its IMDb id. Recommendations are computed without it; the
//! service layer uses it to decorate the top of a ranked list.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DEFAULT_BASE_URL, MetadataFetcher, OmdbClient};
pub use error::{MetadataError, Result};
pub use types::{ImdbId, MovieInfo};
