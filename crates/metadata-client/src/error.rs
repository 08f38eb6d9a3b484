use crate::types::ImdbId;
use thiserror::Error;

/// Errors that can occur when fetching title metadata
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The service answered but has nothing for this id (`Response: "False"`)
    #[error("No metadata for {imdb_id}: {reason}")]
    Unavailable { imdb_id: ImdbId, reason: String },

    #[error("Metadata service returned {status} for {imdb_id}")]
    Status {
        imdb_id: ImdbId,
        status: reqwest::StatusCode,
    },

    #[error("Metadata request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
