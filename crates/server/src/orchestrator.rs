//! # Recommendation Orchestrator
//!
//! Coordinates the recommendation flow for a query title:
//! 1. Join ratings with movies for the loaded dataset snapshot
//! 2. Resolve the title to a movie id
//! 3. Build (or reuse) the interaction and genre matrices
//! 4. Rank every other movie by blended similarity
//! 5. Walk the ranked list, attach metadata for each candidate and stop
//!    once `limit` candidates have usable metadata
//!
//! Steps 1-4 are CPU-bound and run on the blocking pool. Step 5 awaits the
//! metadata service one candidate at a time; a candidate whose metadata is
//! missing is skipped, never fatal.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheKey, RecommendationCache};
use crate::config::Config;
use data_loader::{DataIndex, MovieId};
use metadata_client::{ImdbId, MetadataFetcher, MovieInfo, OmdbClient};
use similarity::{Recommender, ScoredMovie, resolve_title};

/// Final recommendation returned to the user
#[derive(Debug, Clone)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub imdb_id: ImdbId,
    /// Blended similarity to the query movie
    pub score: f64,
    /// Metadata as reported by the metadata service
    pub info: MovieInfo,
}

/// Main orchestrator that ties the dataset, the similarity core, the caches
/// and the metadata fetcher together
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    data_index: Arc<DataIndex>,
    fingerprint: u64,
    recommender: Recommender,
    fetcher: Arc<dyn MetadataFetcher>,
    cache: Arc<RecommendationCache>,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator over an already loaded dataset
    pub fn new(
        data_index: Arc<DataIndex>,
        fetcher: Arc<dyn MetadataFetcher>,
        config: &Config,
    ) -> Self {
        let fingerprint = data_index.fingerprint();
        let cache = RecommendationCache::new(
            config.matrix_cache_ttl(),
            config.recommendation_cache_ttl(),
        );
        debug!(
            "Dataset fingerprint {:016x}, metadata from {}",
            fingerprint,
            fetcher.name()
        );
        Self {
            data_index,
            fingerprint,
            recommender: Recommender::new(),
            fetcher,
            cache: Arc::new(cache),
        }
    }

    /// Load the dataset from `config.data_dir` and connect the OMDb client.
    ///
    /// When `data_dir` does not exist yet the archive at
    /// `config.dataset_url` is downloaded into `config.dataset_root` first.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let config_for_load = config.clone();
        let data_index = tokio::task::spawn_blocking(move || {
            ensure_dataset(&config_for_load)?;
            load_dataset(&config_for_load.data_dir)
        })
        .await
        .context("Dataset loading task panicked")??;

        let fetcher = OmdbClient::new(config.omdb_api_key.clone(), config.omdb_base_url.clone())
            .context("Failed to build OMDb client")?;

        Ok(Self::new(Arc::new(data_index), Arc::new(fetcher), config))
    }

    pub fn data_index(&self) -> &DataIndex {
        &self.data_index
    }

    /// Every other rated movie ranked by blended similarity to `title`.
    ///
    /// Fails with [`similarity::SimilarityError::TitleNotFound`] (reachable
    /// through `downcast_ref`) when no rated movie carries the title.
    #[instrument(skip(self))]
    pub async fn similar_movies(&self, title: &str) -> Result<Arc<Vec<ScoredMovie>>> {
        let key = CacheKey::Similar {
            fingerprint: self.fingerprint,
            title: title.to_string(),
        };
        if let Some(ranked) = self.cache.similar.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(ranked);
        }

        let start_time = Instant::now();
        let ranked = tokio::task::spawn_blocking({
            let this = self.clone();
            let title = title.to_string();
            move || this.rank_blocking(&title)
        })
        .await
        .context("Similarity task panicked")??;

        info!(
            "Ranked {} movies against '{}' in {:.2?}",
            ranked.len(),
            title,
            start_time.elapsed()
        );
        Ok(self.cache.similar.insert(key, ranked))
    }

    /// Up to `limit` top-ranked movies that have metadata.
    ///
    /// Candidates without an IMDb link, or for which the metadata service
    /// has nothing or fails, are logged and skipped.
    #[instrument(skip(self))]
    pub async fn get_recommendations(
        &self,
        title: &str,
        limit: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        let start_time = Instant::now();
        let ranked = self.similar_movies(title).await?;

        let mut recommendations = Vec::with_capacity(limit);
        for scored in ranked.iter() {
            if recommendations.len() >= limit {
                break;
            }
            if let Some(recommendation) = self.decorate(scored).await {
                recommendations.push(recommendation);
            }
        }

        info!(
            "Selected {} recommendations for '{}' in {:.2?}",
            recommendations.len(),
            title,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Ranking on the current thread, reusing cached matrices
    fn rank_blocking(&self, title: &str) -> Result<Vec<ScoredMovie>> {
        let table = self.data_index.join_ratings();
        let movie_id = resolve_title(&table, title)?;

        let interaction = self.cache.interaction.get_or_try_insert_with(
            CacheKey::InteractionMatrix(self.fingerprint),
            || self.recommender.interaction_matrix(&table),
        )?;
        let genre = self.cache.genre.get_or_try_insert_with(
            CacheKey::GenreMatrix(self.fingerprint),
            || self.recommender.genre_matrix(&table),
        )?;

        Ok(self
            .recommender
            .recommend_for(movie_id, &interaction, &genre)?)
    }

    /// Attach metadata to one ranked movie, or `None` if it has to be skipped
    async fn decorate(&self, scored: &ScoredMovie) -> Option<MovieRecommendation> {
        let Some(link) = self.data_index.get_link(scored.movie_id) else {
            warn!("Movie {} has no IMDb link, skipping", scored.movie_id);
            return None;
        };

        let imdb_id = ImdbId(link.imdb_id);
        match self.fetcher.fetch(imdb_id).await {
            Ok(info) => Some(MovieRecommendation {
                movie_id: scored.movie_id,
                imdb_id,
                score: scored.score,
                info,
            }),
            Err(e) => {
                warn!("Skipping movie {}: {}", scored.movie_id, e);
                None
            }
        }
    }
}

/// Download the dataset unless `data_dir` is already there
fn ensure_dataset(config: &Config) -> Result<()> {
    if config.data_dir.is_dir() {
        return Ok(());
    }
    info!(
        "{} not found, fetching {}",
        config.data_dir.display(),
        config.dataset_url
    );
    data_loader::fetch::download_and_extract(&config.dataset_url, &config.dataset_root)
        .context("Failed to fetch dataset")?;
    Ok(())
}

fn load_dataset(data_dir: &Path) -> Result<DataIndex> {
    info!("Loading dataset from {}", data_dir.display());
    DataIndex::load_from_files(data_dir)
        .with_context(|| format!("Failed to load dataset from {}", data_dir.display()))
}
