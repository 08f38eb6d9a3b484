//! Service configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured. The OMDb API key is
//! the only required setting; everything else has a default.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("OMDB_API_KEY is not set; get a key at https://www.omdbapi.com/apikey.aspx")]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] envy::Error),
}

/// Application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OMDb API key
    #[serde(default)]
    pub omdb_api_key: String,

    /// OMDb API base URL
    #[serde(default = "default_omdb_base_url")]
    pub omdb_base_url: String,

    /// Directory holding the MovieLens CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Archive downloaded by `fetch`
    #[serde(default = "default_dataset_url")]
    pub dataset_url: String,

    /// Directory the archive is extracted into
    #[serde(default = "default_dataset_root")]
    pub dataset_root: PathBuf,

    /// Lifetime of cached interaction and genre matrices
    #[serde(default = "default_matrix_cache_ttl_secs")]
    pub matrix_cache_ttl_secs: u64,

    /// Lifetime of cached ranked lists
    #[serde(default = "default_recommendation_cache_ttl_secs")]
    pub recommendation_cache_ttl_secs: u64,

    /// Number of decorated recommendations to return
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_omdb_base_url() -> String {
    metadata_client::DEFAULT_BASE_URL.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/ml-latest-small")
}

fn default_dataset_url() -> String {
    data_loader::fetch::DEFAULT_DATASET_URL.to_string()
}

fn default_dataset_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_matrix_cache_ttl_secs() -> u64 {
    86_400
}

fn default_recommendation_cache_ttl_secs() -> u64 {
    300
}

fn default_top_n() -> usize {
    5
}

impl Config {
    /// Load configuration from the process environment (and `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        if config.omdb_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(config)
    }

    pub fn matrix_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.matrix_cache_ttl_secs)
    }

    pub fn recommendation_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.recommendation_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("OMDB_API_KEY", "abc123")])).unwrap();

        assert_eq!(config.omdb_api_key, "abc123");
        assert_eq!(config.omdb_base_url, "http://www.omdbapi.com");
        assert_eq!(config.data_dir, PathBuf::from("data/ml-latest-small"));
        assert_eq!(config.dataset_root, PathBuf::from("data"));
        assert!(config.dataset_url.ends_with("ml-latest-small.zip"));
        assert_eq!(config.matrix_cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.recommendation_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.top_n, 5);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("OMDB_API_KEY", "abc123"),
            ("DATA_DIR", "/tmp/movies"),
            ("TOP_N", "10"),
            ("RECOMMENDATION_CACHE_TTL_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/movies"));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.recommendation_cache_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_vars(vars(&[("TOP_N", "3")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_blank_api_key() {
        let err = Config::from_vars(vars(&[("OMDB_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_vars(vars(&[("OMDB_API_KEY", "k"), ("TOP_N", "five")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
