//! Bounded, time-expiring cache of job-description embeddings

use crate::error::ProviderError;
use crate::processing::embeddings::Embedding;
use crate::processing::text_processor::NormalizedText;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Lowercase hex SHA-256 of a normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_text(text: &NormalizedText) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_str().as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which entry goes when the cache is over capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Oldest insertion goes first; a hit does not refresh the entry.
    #[default]
    #[serde(rename = "insertion")]
    Insertion,
    /// Least recently inserted or hit goes first.
    #[serde(rename = "lru")]
    LeastRecentlyUsed,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Insertion => write!(f, "insertion"),
            EvictionPolicy::LeastRecentlyUsed => write!(f, "lru"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub capacity: usize,
    pub ttl: Duration,
    pub eviction: EvictionPolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
            eviction: EvictionPolicy::Insertion,
        }
    }
}

/// How a [`EmbeddingCache::get_or_try_insert_with`] call was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
    Hit,
    Computed,
    /// Awaited another caller's in-flight computation.
    Joined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub joined: u64,
    pub evictions: u64,
    pub expirations: u64,
}

struct CacheEntry {
    embedding: Embedding,
    inserted_at: Instant,
    /// Sequence number deciding eviction order; bumped on hit under LRU.
    order: u64,
}

/// Outcome of one provider call, shared by every caller waiting on it.
type Flight = OnceCell<std::result::Result<Embedding, ProviderError>>;

struct InFlight {
    cell: Arc<Flight>,
    /// Callers currently holding a [`FlightGuard`] for this cell.
    waiters: usize,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, InFlight>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    joined: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheInner {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Live entry for `key`, dropping it first if it has outlived `ttl`.
    fn lookup(&mut self, key: &CacheKey, settings: &CacheSettings) -> Option<Embedding> {
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => entry.inserted_at.elapsed() > settings.ttl,
        };

        if expired {
            self.entries.remove(key);
            self.expirations += 1;
            log::debug!("Cache entry {} expired", key);
            return None;
        }

        let seq = match settings.eviction {
            EvictionPolicy::LeastRecentlyUsed => Some(self.next_seq()),
            EvictionPolicy::Insertion => None,
        };
        let entry = self.entries.get_mut(key)?;
        if let Some(seq) = seq {
            entry.order = seq;
        }
        Some(entry.embedding.clone())
    }

    fn insert(&mut self, key: CacheKey, embedding: Embedding, capacity: usize) -> Option<CacheKey> {
        let order = self.next_seq();
        self.entries.insert(
            key,
            CacheEntry {
                embedding,
                inserted_at: Instant::now(),
                order,
            },
        );

        let mut evicted = None;
        while self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.order)
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                    self.evictions += 1;
                    log::debug!("Cache full, evicted {}", key);
                    evicted = Some(key);
                }
                None => break,
            }
        }
        evicted
    }

    /// Retires the flight for `key` if `cell` is still the registered one.
    fn finish_flight(&mut self, key: &CacheKey, cell: &Arc<Flight>) {
        if self
            .in_flight
            .get(key)
            .is_some_and(|flight| Arc::ptr_eq(&flight.cell, cell))
        {
            self.in_flight.remove(key);
        }
    }
}

/// One caller's stake in an in-flight computation. The last guard to go
/// removes a flight that never completed, e.g. when every caller was cancelled.
struct FlightGuard<'a> {
    inner: &'a Mutex<CacheInner>,
    key: &'a CacheKey,
    cell: Arc<Flight>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        let abandoned = match inner.in_flight.get_mut(self.key) {
            Some(flight) if Arc::ptr_eq(&flight.cell, &self.cell) => {
                flight.waiters = flight.waiters.saturating_sub(1);
                flight.waiters == 0
            }
            _ => false,
        };
        if abandoned {
            inner.in_flight.remove(self.key);
        }
    }
}

/// Shared in-memory memo of job-description embeddings keyed by content hash.
///
/// Concurrent misses on the same key are coalesced: one caller computes,
/// the rest await the same in-flight cell and receive its result, error
/// included. Failures are never stored as entries.
pub struct EmbeddingCache {
    settings: CacheSettings,
    inner: Mutex<CacheInner>,
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl EmbeddingCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Embedding> {
        let mut inner = self.inner.lock();
        let found = inner.lookup(key, &self.settings);
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Returns the key evicted to make room, if any.
    pub fn insert(&self, key: CacheKey, embedding: Embedding) -> Option<CacheKey> {
        self.inner.lock().insert(key, embedding, self.settings.capacity)
    }

    /// Whether a live entry exists. Does not touch statistics or recency.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.inserted_at.elapsed() <= self.settings.ttl)
    }

    pub async fn get_or_try_insert_with<F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> std::result::Result<(Embedding, CacheOutcome), ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Embedding, ProviderError>>,
    {
        let guard = {
            let mut inner = self.inner.lock();
            if let Some(embedding) = inner.lookup(key, &self.settings) {
                inner.hits += 1;
                return Ok((embedding, CacheOutcome::Hit));
            }
            inner.misses += 1;
            let flight = inner.in_flight.entry(key.clone()).or_insert_with(|| InFlight {
                cell: Arc::new(OnceCell::new()),
                waiters: 0,
            });
            flight.waiters += 1;
            FlightGuard {
                inner: &self.inner,
                key,
                cell: Arc::clone(&flight.cell),
            }
        };

        let mut computed = false;
        let result = guard
            .cell
            .get_or_init(|| {
                computed = true;
                let pending = compute();
                async {
                    let result = pending.await;
                    {
                        // Publish before waiters wake so a new caller either
                        // hits the entry or starts a fresh flight.
                        let mut inner = self.inner.lock();
                        inner.finish_flight(key, &guard.cell);
                        if let Ok(embedding) = &result {
                            inner.insert(key.clone(), embedding.clone(), self.settings.capacity);
                        }
                    }
                    result
                }
            })
            .await
            .clone();
        drop(guard);

        match result {
            Ok(embedding) if computed => Ok((embedding, CacheOutcome::Computed)),
            Ok(embedding) => {
                self.inner.lock().joined += 1;
                Ok((embedding, CacheOutcome::Joined))
            }
            Err(e) => Err(e),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            len: inner.entries.len(),
            capacity: self.settings.capacity,
            hits: inner.hits,
            misses: inner.misses,
            joined: inner.joined,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }
}
