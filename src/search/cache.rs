//! TTL cache for provider responses.
//!
//! # Design Decisions
//! - Keyed by `SearchRequest::cache_key` so the API key never lands in a key
//! - Expired entries are dropped lazily on read
//! - When full, the oldest entry is evicted before inserting

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::search::types::{CacheKey, SearchResults};

struct CachedEntry {
    results: SearchResults,
    inserted_at: Instant,
}

/// A thread-safe, time-bounded cache of search results.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<DashMap<CacheKey, CachedEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl ResponseCache {
    /// Create a cache keeping entries for `ttl`, holding at most `max_entries`.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Get a fresh cached response.
    pub fn get(&self, key: &CacheKey) -> Option<SearchResults> {
        {
            let entry = self.inner.get(key)?;
            if entry.inserted_at.elapsed() <= self.ttl {
                return Some(entry.results.clone());
            }
        }

        // Another writer may have refreshed the entry in between
        self.inner
            .remove_if(key, |_, entry| entry.inserted_at.elapsed() > self.ttl);
        None
    }

    /// Store a response.
    pub fn insert(&self, key: CacheKey, results: SearchResults) {
        if !self.inner.contains_key(&key) && self.inner.len() >= self.max_entries {
            self.evict_oldest();
        }

        self.inner.insert(
            key,
            CachedEntry {
                results,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|r| r.value().inserted_at)
            .map(|r| r.key().clone());

        if let Some(key) = oldest {
            self.inner.remove(&key);
        }
    }
}
