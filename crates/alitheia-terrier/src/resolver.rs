//! Partial-cache key resolution.
//!
//! Resolves a batch of opaque keys to descriptive values in two phases:
//!
//! 1. Partition: keys already in the local cache are answered from it.
//! 2. Fetch and merge: all remaining keys go to the remote collaborator in a
//!    single batch call; whatever comes back is cached and merged.
//!
//! A remote failure never discards the cache hits of the same call. It is
//! reported in [`Resolution::failure`] next to the partial values.
//!
//! The cache only grows. Entries are never evicted or invalidated.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{TerrierError, TerrierResult};

/// Remote collaborator able to resolve many keys in one call.
///
/// Implementations return the subset of keys they could resolve. A key the
/// remote side does not know is simply left out of the answer; an `Err` means
/// the whole call failed (transport or protocol fault).
#[async_trait]
pub trait BatchFetcher<K, V>: Send + Sync {
    async fn fetch_values(&self, keys: &[K]) -> TerrierResult<Vec<(K, V)>>;
}

/// Outcome of one [`PartialCacheResolver::resolve_batch`] call.
#[derive(Debug, Clone)]
pub struct Resolution<K, V> {
    /// Every requested key that could be resolved.
    pub values: HashMap<K, V>,

    /// Requested keys without a value.
    pub unresolved: HashSet<K>,

    /// Set when the remote fetch failed. Without it, `unresolved` holds keys
    /// the remote side has no mapping for.
    pub failure: Option<TerrierError>,
}

impl<K: Eq + Hash, V> Resolution<K, V> {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            unresolved: HashSet::new(),
            failure: None,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// All requested keys were resolved.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty() && self.failure.is_none()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Turn a failed resolution into an error, dropping the partial values.
    pub fn into_result(self) -> TerrierResult<HashMap<K, V>> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(self.values),
        }
    }
}

/// Counters kept by a resolver.
#[derive(Debug, Default)]
struct ResolverCounters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    remote_calls: AtomicU64,
    remote_failures: AtomicU64,
}

/// Point-in-time copy of the resolver counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub remote_calls: u64,
    pub remote_failures: u64,
    pub cached_entries: usize,
}

/// Resolver with a process-lifetime, grow-only cache in front of a batch fetcher.
///
/// Safe to share between tasks. The cache lock is never held across the
/// remote call, so two concurrent calls missing the same key may both fetch
/// it. The later insert wins.
pub struct PartialCacheResolver<K, V, F> {
    fetcher: F,
    cache: RwLock<HashMap<K, V>>,
    counters: ResolverCounters,
}

impl<K, V, F> PartialCacheResolver<K, V, F>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
    F: BatchFetcher<K, V>,
{
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(HashMap::new()),
            counters: ResolverCounters::default(),
        }
    }

    /// Start from already known values.
    pub fn with_cache(fetcher: F, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(entries.into_iter().collect()),
            counters: ResolverCounters::default(),
        }
    }

    /// Resolve a batch of keys.
    ///
    /// Duplicates collapse. At most one remote call is made, and none when
    /// every key is cached (including the empty batch).
    pub async fn resolve_batch(&self, keys: &[K]) -> Resolution<K, V> {
        let mut resolution = Resolution::new();
        let misses = self.partition(keys, &mut resolution.values).await;

        self.counters
            .cache_hits
            .fetch_add(resolution.values.len() as u64, Ordering::Relaxed);
        self.counters
            .cache_misses
            .fetch_add(misses.len() as u64, Ordering::Relaxed);

        if misses.is_empty() {
            debug!(hits = resolution.values.len(), "batch resolved from cache");
            return resolution;
        }

        debug!(
            hits = resolution.values.len(),
            misses = misses.len(),
            "fetching missing keys"
        );
        self.counters.remote_calls.fetch_add(1, Ordering::Relaxed);

        match self.fetcher.fetch_values(&misses).await {
            Ok(fetched) => {
                let fetched_count = fetched.len();
                self.merge(&misses, fetched, &mut resolution.values).await;

                resolution.unresolved = misses
                    .into_iter()
                    .filter(|key| !resolution.values.contains_key(key))
                    .collect();

                if resolution.unresolved.is_empty() {
                    info!(
                        resolved = resolution.values.len(),
                        fetched = fetched_count,
                        "batch resolved"
                    );
                } else {
                    warn!(
                        resolved = resolution.values.len(),
                        unresolved = resolution.unresolved.len(),
                        "remote side has no mapping for some keys"
                    );
                }
            }
            Err(e) => {
                self.counters.remote_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    error = %e,
                    hits = resolution.values.len(),
                    misses = misses.len(),
                    "batch fetch failed, returning cached values only"
                );
                resolution.unresolved = misses.into_iter().collect();
                resolution.failure = Some(e);
            }
        }

        resolution
    }

    /// Split `keys` into cache hits (written to `hits`) and distinct misses,
    /// in first-seen order.
    async fn partition(&self, keys: &[K], hits: &mut HashMap<K, V>) -> Vec<K> {
        let cache = self.cache.read().await;
        let mut seen: HashSet<&K> = HashSet::with_capacity(keys.len());
        let mut misses = Vec::new();

        for key in keys {
            if !seen.insert(key) {
                continue;
            }
            match cache.get(key) {
                Some(value) => {
                    hits.insert(key.clone(), value.clone());
                }
                None => misses.push(key.clone()),
            }
        }

        misses
    }

    /// Cache every fetched pair; only requested keys go into `values`.
    async fn merge(&self, requested: &[K], fetched: Vec<(K, V)>, values: &mut HashMap<K, V>) {
        let requested: HashSet<&K> = requested.iter().collect();
        let mut cache = self.cache.write().await;

        for (key, value) in fetched {
            if requested.contains(&key) {
                values.insert(key.clone(), value.clone());
            }
            cache.insert(key, value);
        }
    }

    /// Cached value for a key, without any remote call.
    pub async fn cached(&self, key: &K) -> Option<V> {
        self.cache.read().await.get(key).cloned()
    }

    /// Add known values to the cache.
    pub async fn prime(&self, entries: impl IntoIterator<Item = (K, V)>) {
        self.cache.write().await.extend(entries);
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn stats(&self) -> ResolverStats {
        ResolverStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            remote_calls: self.counters.remote_calls.load(Ordering::Relaxed),
            remote_failures: self.counters.remote_failures.load(Ordering::Relaxed),
            cached_entries: self.cache_len().await,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}
