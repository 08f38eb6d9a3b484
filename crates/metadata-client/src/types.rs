use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric IMDb title id as stored in the MovieLens `links.csv`.
///
/// Displays in the form the metadata service expects: `tt` followed by the
/// id zero padded to seven digits (`114709` -> `tt0114709`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImdbId(pub u32);

impl fmt::Display for ImdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tt{:07}", self.0)
    }
}

impl From<u32> for ImdbId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Title metadata as returned by the OMDb API.
///
/// Only `Response` is always present. On `"False"` the service sends an
/// `Error` message instead of the descriptive fields, so those default to
/// empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieInfo {
    /// `"True"` or `"False"`
    pub response: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub released: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MovieInfo {
    /// Whether the service found the title. Check before using any other field.
    pub fn is_available(&self) -> bool {
        self.response == "True"
    }

    /// Poster URL, if the service has one (`"N/A"` means none)
    pub fn poster_url(&self) -> Option<&str> {
        match self.poster.as_str() {
            "" | "N/A" => None,
            url => Some(url),
        }
    }
}
