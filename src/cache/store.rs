//! Shared response cache with LRU eviction.
//!
//! # Responsibilities
//! - Map request URI → captured response bytes, bounded in total size
//! - Serve lookups as reference-counted bodies safe to stream after eviction
//! - Evict strictly least-recently-used entries past the aggregate cap
//!
//! # Design Decisions
//! - One mutex guards all state; every operation is atomic with respect to
//!   every other, and the lock is never held across socket I/O
//! - Lookups hand out `Arc<[u8]>` clones, so an entry evicted mid-stream
//!   stays alive for the handler still writing it to a client

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cache::lru::RecencyList;
use crate::config::CacheConfig;
use crate::observability::metrics;

/// Concurrency-safe response cache keyed by exact request URI.
///
/// Keys are case-sensitive and unnormalized; `http://h/a` and `http://h/A`
/// are distinct entries.
#[derive(Debug)]
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    max_object_bytes: usize,
    max_cache_bytes: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Arc<[u8]>>,
    recency: RecencyList,
    total_bytes: usize,
}

/// One entry in a diagnostic cache listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Request URI the entry is keyed by.
    pub key: String,
    /// Captured response size in bytes.
    pub size: usize,
}

/// Read-consistent listing of the cache, most recently used first.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub entries: Vec<SnapshotEntry>,
    pub total_bytes: usize,
}

impl ResponseCache {
    /// Create an empty cache with the given capacity limits.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_object_bytes: config.max_object_bytes,
            max_cache_bytes: config.max_cache_bytes,
        }
    }

    /// Largest response body the cache will accept.
    pub fn max_object_bytes(&self) -> usize {
        self.max_object_bytes
    }

    /// Look up a cached response, marking the entry most recently used.
    ///
    /// The returned body is an independent reference-counted view; evicting
    /// the entry afterwards does not invalidate it.
    pub fn lookup(&self, key: &str) -> Option<Arc<[u8]>> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(body) => {
                inner.recency.touch(key);
                metrics::record_cache_hit();
                Some(body)
            }
            None => {
                metrics::record_cache_miss();
                None
            }
        }
    }

    /// Store or replace the response for `key`.
    ///
    /// Responses larger than the per-object cap are never stored and the call
    /// is a no-op. After a successful insert, least-recently-used entries
    /// (never the one just inserted) are evicted until the aggregate cap
    /// holds again. Returns whether the body was stored.
    pub fn insert(&self, key: &str, body: Vec<u8>) -> bool {
        let size = body.len();
        if size > self.max_object_bytes {
            tracing::debug!(
                key = %key,
                size,
                max_object_bytes = self.max_object_bytes,
                "Response exceeds object cap, not cached"
            );
            return false;
        }

        let mut inner = self.lock();
        if let Some(previous) = inner.entries.insert(key.to_string(), Arc::from(body)) {
            inner.total_bytes -= previous.len();
        }
        inner.total_bytes += size;
        inner.recency.touch(key);

        let mut evicted = 0usize;
        while inner.total_bytes > self.max_cache_bytes {
            let victim = match inner.recency.peek_lru() {
                Some(candidate) if candidate != key => candidate.clone(),
                // Only the fresh entry remains; the object cap keeps it legal.
                _ => break,
            };
            inner.recency.remove(&victim);
            if let Some(body) = inner.entries.remove(&victim) {
                inner.total_bytes -= body.len();
                evicted += 1;
                tracing::debug!(key = %victim, freed = body.len(), "Evicted cache entry");
            }
        }

        metrics::record_evictions(evicted);
        metrics::record_cache_usage(inner.total_bytes, inner.entries.len());
        true
    }

    /// Read-consistent listing of current entries, for diagnostics and tests.
    pub fn snapshot(&self) -> CacheSnapshot {
        let inner = self.lock();
        let entries = inner
            .recency
            .iter()
            .filter_map(|key| {
                inner.entries.get(key).map(|body| SnapshotEntry {
                    key: key.clone(),
                    size: body.len(),
                })
            })
            .collect();
        CacheSnapshot {
            entries,
            total_bytes: inner.total_bytes,
        }
    }

    /// Sum of all cached entry sizes.
    pub fn total_bytes(&self) -> usize {
        self.lock().total_bytes
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A handler that panicked while holding the lock must not poison the
    // cache for every other connection.
    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
