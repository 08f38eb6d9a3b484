//! In-process TTL caches for derived matrices and ranked lists.
//!
//! Values are stored behind `Arc` and never mutated once inserted, so
//! concurrent readers can hold on to a cached matrix while another request
//! replaces it. Expired entries are never returned; they are purged on the
//! next insert. Concurrent misses on one key are collapsed so an expensive
//! value is computed once.

use data_loader::UserId;
use parking_lot::{Mutex, RwLock};
use similarity::{LabeledMatrix, ScoredMovie};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded map whose entries expire `ttl` after insertion.
///
/// When full, inserting a new key evicts the entry closest to expiry.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    /// One lock per key currently being computed
    in_flight: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Live value for `key`, if any
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key` and return the shared handle
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let now = Instant::now();
        let mut entries = self.entries.write();

        entries.retain(|_, entry| !entry.is_expired(now));
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            Entry {
                value: value.clone(),
                expires_at: now + self.ttl,
            },
        );
        value
    }

    /// Cached value for `key`, or compute, store and return it.
    ///
    /// Callers that miss on the same key at the same time wait for the
    /// first one instead of computing in parallel. Errors are not cached;
    /// the next waiter retries.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let slot = self
            .in_flight
            .lock()
            .entry(key.clone())
            .or_default()
            .clone();
        let _computing = slot.lock();
        let result = match self.get(&key) {
            Some(value) => Ok(value),
            None => compute().map(|value| self.insert(key.clone(), value)),
        };

        // Later callers either hit the cache or start a fresh slot
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(&key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
            in_flight.remove(&key);
        }
        result
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Cache key: which derived value, for which dataset snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    InteractionMatrix(u64),
    GenreMatrix(u64),
    Similar { fingerprint: u64, title: String },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::InteractionMatrix(fp) => write!(f, "interaction:{:016x}", fp),
            CacheKey::GenreMatrix(fp) => write!(f, "genre:{:016x}", fp),
            CacheKey::Similar { fingerprint, title } => {
                write!(f, "similar:{:016x}:{}", fingerprint, title)
            }
        }
    }
}

/// The caches owned by the orchestrator
pub struct RecommendationCache {
    pub interaction: TtlCache<CacheKey, LabeledMatrix<UserId>>,
    pub genre: TtlCache<CacheKey, LabeledMatrix<String>>,
    pub similar: TtlCache<CacheKey, Vec<ScoredMovie>>,
}

impl RecommendationCache {
    /// Matrices are large and rarely change, so only a couple are kept
    const MATRIX_CAPACITY: usize = 2;
    const RESULT_CAPACITY: usize = 1024;

    pub fn new(matrix_ttl: Duration, result_ttl: Duration) -> Self {
        debug!(
            "Creating caches: matrices {:?}, results {:?}",
            matrix_ttl, result_ttl
        );
        Self {
            interaction: TtlCache::new(matrix_ttl, Self::MATRIX_CAPACITY),
            genre: TtlCache::new(matrix_ttl, Self::MATRIX_CAPACITY),
            similar: TtlCache::new(result_ttl, Self::RESULT_CAPACITY),
        }
    }

    pub fn clear(&self) {
        self.interaction.clear();
        self.genre.clear();
        self.similar.clear();
    }
}
