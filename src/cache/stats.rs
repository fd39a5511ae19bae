//! Cache Statistics Module
//!
//! Tracks hit/miss/eviction counters and builds the introspection report.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Counters ==
/// Running totals kept by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Reads that found a fresh entry
    pub hits: u64,
    /// Reads that found nothing fresh
    pub misses: u64,
    /// Entries removed to respect the size bound
    pub evictions: u64,
    /// Expired entries removed by lookups or sweeps
    pub expirations: u64,
    /// Entries removed by pattern invalidation
    pub invalidations: u64,
    /// Callers that waited on another caller's in-flight producer
    pub coalesced: u64,
    /// Background sweeps completed
    pub sweeps: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates a new CacheCounters with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    pub fn record_sweep(&mut self) {
        self.sweeps += 1;
    }
}

// == Entry Stats ==
/// Per-entry view in a stats report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryStats {
    pub key: String,
    /// Length of the value's JSON encoding; advisory only
    pub approx_bytes: usize,
    pub access_count: u64,
    /// Time since the value was stored
    pub age: Duration,
    /// Remaining freshness
    pub ttl_remaining: Duration,
}

// == Cache Stats ==
/// Point-in-time report of the cache's contents and counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// When the report was taken
    pub generated_at: DateTime<Utc>,
    /// Current number of entries, expired-but-unswept included
    pub size: usize,
    /// Configured size bound
    pub max_size: usize,
    #[serde(flatten)]
    pub counters: CacheCounters,
    /// Sum of every entry's `approx_bytes`
    pub approx_total_bytes: usize,
    /// Entries sorted by key
    pub entries: Vec<EntryStats>,
}

impl CacheStats {
    /// Builds a report from per-entry stats, sorting them by key.
    pub fn new(max_size: usize, counters: CacheCounters, mut entries: Vec<EntryStats>) -> Self {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        let approx_total_bytes = entries.iter().map(|e| e.approx_bytes).sum();

        Self {
            generated_at: Utc::now(),
            size: entries.len(),
            max_size,
            counters,
            approx_total_bytes,
            entries,
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.counters.hits + self.counters.misses;
        if total == 0 {
            0.0
        } else {
            self.counters.hits as f64 / total as f64
        }
    }

    /// Returns the report entry for `key`, if present.
    pub fn entry(&self, key: &str) -> Option<&EntryStats> {
        self.entries
            .binary_search_by(|e| e.key.as_str().cmp(key))
            .ok()
            .map(|idx| &self.entries[idx])
    }
}
