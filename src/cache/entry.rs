//! Cache Entry Module
//!
//! Defines a single memoized value with expiry and access bookkeeping.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::MAX_AGE_LIMIT;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// `expires_at` is always strictly after `created_at`, and `access_count`
/// starts at 1 because storing a value counts as its first access.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The memoized value
    pub data: T,
    /// When the value was stored
    pub created_at: Instant,
    /// Absolute expiry, `created_at + max_age`
    pub expires_at: Instant,
    /// Number of successful reads, including the store itself
    pub access_count: u64,
    /// When the entry was last read
    pub last_accessed_at: Instant,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry that stays fresh for `max_age`.
    ///
    /// # Arguments
    /// * `data` - The value to store
    /// * `max_age` - Lifetime of the entry, must be non-zero; clamped to
    ///   `MAX_AGE_LIMIT`
    pub fn new(data: T, max_age: Duration) -> Self {
        Self::new_at(data, max_age, Instant::now())
    }

    pub(crate) fn new_at(data: T, max_age: Duration, now: Instant) -> Self {
        Self {
            data,
            created_at: now,
            expires_at: now + max_age.min(MAX_AGE_LIMIT),
            access_count: 1,
            last_accessed_at: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: the entry is still fresh at exactly `expires_at`
    /// and expired at any instant strictly after it.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    // == Touch ==
    /// Records a successful read at `now`.
    pub(crate) fn touch_at(&mut self, now: Instant) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed_at = now;
    }

    // == Age ==
    /// Time elapsed since the value was stored.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.created_at)
    }

    // == Time To Live ==
    /// Remaining freshness, or `Duration::ZERO` once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
