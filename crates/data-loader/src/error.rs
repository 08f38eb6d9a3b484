//! Error types for the data-loader crate.
//!
//! Every failure mode of loading, validating and fetching the MovieLens
//! dataset is a variant of [`DataLoadError`]. The `#[derive(Error)]` macro
//! from thiserror implements `std::error::Error` and `Display` from the
//! `#[error(...)]` attributes.

use thiserror::Error;

/// Errors that can occur during data loading, parsing and fetching
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record (bad quoting, wrong column type, ...)
    #[error("CSV error in {file}: {source}")]
    CsvError {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A record was readable but one of its fields made no sense
    #[error("Parse error at record {record} in {file}: {reason}")]
    ParseError {
        file: String,
        record: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., rating for non-existent movie)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Downloading the dataset archive failed
    #[error("Download of {url} failed: {source}")]
    DownloadError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The downloaded archive could not be opened or extracted
    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
