//! Memoization Engine Module
//!
//! `MemoCache` wraps a `CacheStore` for shared async use: the table lives
//! behind an `Arc<RwLock<_>>`, concurrent misses on the same key share one
//! producer run, and the expiry sweep task is owned by the engine.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore, KeyPattern};
use crate::config::{CacheConfig, CacheOptions};
use crate::error::{validate_key, CacheError, Result};
use crate::tasks::spawn_sweep_task;

/// Keys with a producer currently running, mapped to the channel their
/// waiters subscribe to.
type InFlight = Mutex<HashMap<String, broadcast::Sender<()>>>;

struct Shared<T> {
    store: Arc<RwLock<CacheStore<T>>>,
    in_flight: InFlight,
    config: CacheConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

// == Flight ==
enum Flight<'a> {
    /// This caller runs the producer
    Leader(FlightGuard<'a>),
    /// Another caller is running it; wait for the signal
    Follower(broadcast::Receiver<()>),
}

/// Removes the in-flight marker and wakes waiters when dropped, whether the
/// producer succeeded, failed, or the leader's future was cancelled.
struct FlightGuard<'a> {
    registry: &'a InFlight,
    key: String,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(tx) = self.registry.lock().remove(&self.key) {
            // No receivers is fine; dropping the sender also closes the channel
            let _ = tx.send(());
        }
    }
}

// == Memo Cache ==
/// Time-aware memoization cache.
///
/// Cloning is cheap and every clone shares the same table, so one instance
/// can be constructed per logical scope and handed to each consumer.
///
/// # Example
/// ```ignore
/// let cache: MemoCache<String> = MemoCache::with_sweeper(CacheConfig::default())?;
/// let name = cache
///     .get_or_compute("user:42", || async { fetch_name(42).await })
///     .await?;
/// ```
pub struct MemoCache<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for MemoCache<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> MemoCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new cache without a background sweep.
    ///
    /// Expired entries are still never served; they are just only reclaimed
    /// when read, purged explicitly, or evicted.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                store: Arc::new(RwLock::new(CacheStore::new(config.clone()))),
                in_flight: Mutex::new(HashMap::new()),
                config,
                sweeper: Mutex::new(None),
            }),
        })
    }

    /// Creates a new cache and starts its expiry sweep.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_sweeper(config: CacheConfig) -> Result<Self> {
        let cache = Self::new(config)?;
        cache.start_sweeper();
        Ok(cache)
    }

    /// Returns the default policy.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    // == Sweeper Lifecycle ==
    /// Starts the periodic expiry sweep, replacing any sweep already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_sweeper(&self) {
        let mut slot = self.shared.sweeper.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(spawn_sweep_task(
            Arc::clone(&self.shared.store),
            self.shared.config.sweep_interval,
        ));
    }

    /// Returns true while a sweep task is running.
    pub fn is_sweeping(&self) -> bool {
        self.shared
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweep task. Entries are kept; dropping the last clone of
    /// the cache also stops it.
    pub fn shutdown(&self) {
        if let Some(handle) = self.shared.sweeper.lock().take() {
            handle.abort();
            info!("Expiry sweep stopped");
        }
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, running `producer` on a miss.
    ///
    /// See [`MemoCache::get_or_compute_with`].
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        producer: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<CacheError>,
    {
        self.get_or_compute_with(key, producer, &CacheOptions::default())
            .await
    }

    /// Returns the cached value for `key`, running `producer` on a miss, with
    /// per-call policy overrides.
    ///
    /// A fresh entry is returned without calling `producer`. Otherwise the
    /// producer runs once and its value is stored before being returned.
    /// Concurrent misses on the same key wait for the first caller's producer
    /// instead of starting their own.
    ///
    /// A producer error is returned unchanged and nothing is stored. Callers
    /// waiting on a failed or cancelled producer retry with their own.
    pub async fn get_or_compute_with<F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        options: &CacheOptions,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<CacheError>,
    {
        validate_key(key)?;
        let policy = self.shared.config.merged(options);
        policy.validate()?;

        let _flight = loop {
            if let Some(value) = self.shared.store.write().await.lookup(key) {
                return Ok(value);
            }

            match self.join_flight(key) {
                Flight::Leader(guard) => break guard,
                Flight::Follower(mut rx) => {
                    debug!(key, "Waiting on in-flight producer");
                    self.shared.store.write().await.record_coalesced();
                    // A value or a closed channel both mean the leader is done
                    let _ = rx.recv().await;
                }
            }
        };

        // A previous leader may have committed between the lookup and registering
        if self.shared.store.read().await.contains(key) {
            if let Some(value) = self.shared.store.write().await.lookup(key) {
                return Ok(value);
            }
        }

        debug!(key, "Cache miss, running producer");
        let value = producer().await?;

        self.shared
            .store
            .write()
            .await
            .insert(key.to_string(), value.clone(), &policy);

        Ok(value)
    }

    fn join_flight(&self, key: &str) -> Flight<'_> {
        let mut in_flight = self.shared.in_flight.lock();

        if let Some(tx) = in_flight.get(key) {
            return Flight::Follower(tx.subscribe());
        }

        let (tx, _rx) = broadcast::channel(1);
        in_flight.insert(key.to_string(), tx);
        Flight::Leader(FlightGuard {
            registry: &self.shared.in_flight,
            key: key.to_string(),
        })
    }

    // == Set ==
    /// Stores `data` under `key` unconditionally.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `data` - The value to store
    /// * `max_age` - Optional lifetime (uses the configured default if None)
    pub async fn set(&self, key: &str, data: T, max_age: Option<Duration>) -> Result<()> {
        validate_key(key)?;
        let policy = self.shared.config.merged(&CacheOptions {
            max_age,
            max_size: None,
        });
        policy.validate()?;

        self.shared
            .store
            .write()
            .await
            .insert(key.to_string(), data, &policy);
        Ok(())
    }

    // == Get Only ==
    /// Returns the cached value without computing anything.
    ///
    /// A hit still counts as an access for eviction ranking. Absent and
    /// expired keys both yield `CacheError::NotFound`.
    pub async fn get_only(&self, key: &str) -> Result<T> {
        validate_key(key)?;

        self.shared
            .store
            .write()
            .await
            .lookup(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Has ==
    /// Returns true if a fresh entry exists. Does not count as an access.
    pub async fn has(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.shared.store.read().await.contains(key))
    }

    // == Delete ==
    /// Removes an entry, returning whether it existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.shared.store.write().await.remove(key))
    }

    // == Clear ==
    /// Removes every entry.
    pub async fn clear(&self) {
        self.shared.store.write().await.clear();
        debug!("Cache cleared");
    }

    // == Invalidate Pattern ==
    /// Removes every entry whose key matches `pattern`.
    ///
    /// Plain strings match as substrings; use [`KeyPattern::regex`] for
    /// regular expressions. Returns the number of entries removed.
    pub async fn invalidate_pattern(&self, pattern: impl Into<KeyPattern>) -> usize {
        let pattern = pattern.into();
        let removed = self.shared.store.write().await.invalidate(&pattern);
        debug!(?pattern, removed, "Invalidated entries by pattern");
        removed
    }

    // == Purge Expired ==
    /// Removes all expired entries now, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.shared.store.write().await.purge_expired()
    }

    // == Length ==
    /// Returns the current number of entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.shared.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shared.store.read().await.is_empty()
    }
}

impl<T> MemoCache<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    // == Stats ==
    /// Returns an introspection report of the table and its counters.
    pub async fn stats(&self) -> CacheStats {
        self.shared.store.read().await.stats()
    }
}
