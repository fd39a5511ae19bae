//! Cache Store Module
//!
//! The entry table: HashMap storage with expiry checks, LFU eviction,
//! pattern invalidation and statistics. All mutation goes through `&mut self`,
//! so callers sharing a store wrap it in a lock.

use std::collections::HashMap;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::eviction::select_victim;
use crate::cache::{CacheCounters, CacheEntry, CacheStats, EntryStats, KeyPattern};
use crate::config::CacheConfig;

// == Cache Store ==
/// Entry table with expiry and size-bounded eviction.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Performance counters
    counters: CacheCounters,
    /// Default policy for inserts without overrides
    config: CacheConfig,
}

impl<T: Clone> CacheStore<T> {
    // == Constructor ==
    /// Creates a new empty store using `config` as its default policy.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            counters: CacheCounters::new(),
            config,
        }
    }

    /// Returns the default policy.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Lookup ==
    /// Returns a clone of the value if a fresh entry exists, recording the access.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn lookup(&mut self, key: &str) -> Option<T> {
        let now = Instant::now();

        let expired = match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.touch_at(now);
                let value = entry.data.clone();
                self.counters.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.counters.record_expirations(1);
        }
        self.counters.record_miss();
        None
    }

    // == Contains ==
    /// Returns true if a fresh entry exists. No bookkeeping is touched.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Insert ==
    /// Stores `data` under `key`, replacing any previous entry.
    ///
    /// `policy` supplies the lifetime and size bound for this insert. When the
    /// key is new and the table is full, the least valuable entries are
    /// evicted first; overwriting an existing key never evicts.
    pub fn insert(&mut self, key: String, data: T, policy: &CacheConfig) {
        if !self.entries.contains_key(&key) {
            self.make_room(policy.max_size);
        }

        let entry = CacheEntry::new(data, policy.max_age);
        self.entries.insert(key, entry);
    }

    /// Evicts until one more entry fits under `max_size`.
    fn make_room(&mut self, max_size: usize) {
        while self.entries.len() >= max_size {
            // Only reachable if the length and the table disagree, i.e. a
            // counting bug; bail out rather than loop
            let Some(victim) = select_victim(&self.entries) else {
                warn!(
                    len = self.entries.len(),
                    max_size, "Eviction found no candidate, skipping"
                );
                return;
            };
            self.entries.remove(&victim);
            self.counters.record_eviction();
            debug!(key = %victim, "Evicted least valuable entry");
        }
    }

    // == Remove ==
    /// Removes an entry by key, returning whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Invalidate ==
    /// Removes every entry whose key matches `pattern`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, pattern: &KeyPattern) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.matches(key));
        let removed = before - self.entries.len();

        self.counters.record_invalidations(removed);
        removed
    }

    // == Purge Expired ==
    /// Removes all expired entries from the table.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        self.counters.record_expirations(removed);
        removed
    }

    pub(crate) fn record_coalesced(&mut self) {
        self.counters.record_coalesced();
    }

    pub(crate) fn record_sweep(&mut self) {
        self.counters.record_sweep();
    }

    /// Returns the running counters.
    pub fn counters(&self) -> CacheCounters {
        self.counters
    }

    // == Length ==
    /// Returns the current number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only access to a stored entry, fresh or not.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }
}

impl<T: Clone + Serialize> CacheStore<T> {
    // == Stats ==
    /// Builds an introspection report.
    ///
    /// Byte sizes are the length of each value's JSON encoding, 0 for values
    /// that fail to encode.
    pub fn stats(&self) -> CacheStats {
        let entries = self
            .entries
            .iter()
            .map(|(key, entry)| EntryStats {
                key: key.clone(),
                approx_bytes: serde_json::to_vec(&entry.data)
                    .map(|bytes| bytes.len())
                    .unwrap_or(0),
                access_count: entry.access_count,
                age: entry.age(),
                ttl_remaining: entry.ttl_remaining(),
            })
            .collect();

        CacheStats::new(self.config.max_size, self.counters, entries)
    }
}
