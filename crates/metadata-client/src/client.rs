//! OMDb HTTP client.
//!
//! Issues `GET {base_url}/?i=tt0114709&apikey=...` and decodes the JSON body
//! into a [`MovieInfo`]. A `"False"` response is turned into
//! [`MetadataError::Unavailable`] so callers cannot use an empty record by
//! accident.

use crate::error::{MetadataError, Result};
use crate::types::{ImdbId, MovieInfo};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::debug;

/// Public OMDb endpoint
pub const DEFAULT_BASE_URL: &str = "http://www.omdbapi.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of per-title metadata.
///
/// The orchestrator only talks to this trait, so tests can substitute a
/// stub and other providers can be plugged in.
#[async_trait::async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch metadata for one title.
    ///
    /// Returns [`MetadataError::Unavailable`] when the provider has nothing
    /// for the id; that is expected for part of any catalogue.
    async fn fetch(&self, imdb_id: ImdbId) -> Result<MovieInfo>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// [`MetadataFetcher`] backed by the OMDb API
#[derive(Clone)]
pub struct OmdbClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
}

impl OmdbClient {
    /// Create a client for `base_url` (normally [`DEFAULT_BASE_URL`])
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for OmdbClient {
    async fn fetch(&self, imdb_id: ImdbId) -> Result<MovieInfo> {
        let url = format!("{}/", self.base_url);
        debug!("Fetching metadata for {}", imdb_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("i", imdb_id.to_string()), ("apikey", self.api_key.clone())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status { imdb_id, status });
        }

        let info: MovieInfo = response.json().await?;
        if !info.is_available() {
            return Err(MetadataError::Unavailable {
                imdb_id,
                reason: info
                    .error
                    .unwrap_or_else(|| format!("Response was {:?}", info.response)),
            });
        }
        Ok(info)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
