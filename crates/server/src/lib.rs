//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the service layer around the similarity core:
//! configuration, the TTL caches and the orchestrator that attaches
//! metadata to ranked movies.

pub mod cache;
pub mod config;
pub mod orchestrator;

pub use cache::{CacheKey, RecommendationCache, TtlCache};
pub use config::{Config, ConfigError};
pub use orchestrator::{MovieRecommendation, RecommendationOrchestrator};
