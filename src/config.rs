//! Configuration Module
//!
//! Default cache policy loaded from environment variables, plus per-call
//! overrides that merge over it.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default entry lifetime (5 minutes)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Default interval between expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Longest accepted entry lifetime (100 years); longer values could overflow
/// the expiry instant
pub const MAX_AGE_LIMIT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Config ==
/// Process-wide cache policy.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a stored value stays fresh
    pub max_age: Duration,
    /// Maximum number of entries the table can hold
    pub max_size: usize,
    /// Interval between background expiry sweeps
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_AGE_SECS` - Entry lifetime in seconds (default: 300)
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 100)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            max_age: env::var("CACHE_MAX_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_MAX_AGE),
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SIZE),
            sweep_interval: env::var("CACHE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
        }
    }

    /// Sets the entry lifetime.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets the maximum number of entries.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the interval between expiry sweeps.
    pub fn sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    // == Merge ==
    /// Returns a copy of this config with every `Some` field of `options`
    /// replacing the corresponding default.
    pub fn merged(&self, options: &CacheOptions) -> Self {
        Self {
            max_age: options.max_age.unwrap_or(self.max_age),
            max_size: options.max_size.unwrap_or(self.max_size),
            sweep_interval: self.sweep_interval,
        }
    }

    // == Validate ==
    /// Checks that every field is usable.
    ///
    /// A zero `max_age` would store entries that are born expired, one above
    /// `MAX_AGE_LIMIT` could overflow the expiry instant, and a zero
    /// `max_size` could never hold the entry being inserted.
    pub fn validate(&self) -> Result<()> {
        if self.max_age.is_zero() {
            return Err(CacheError::InvalidConfig(
                "max_age must be greater than zero".to_string(),
            ));
        }
        if self.max_age > MAX_AGE_LIMIT {
            return Err(CacheError::InvalidConfig(format!(
                "max_age must not exceed {} seconds",
                MAX_AGE_LIMIT.as_secs()
            )));
        }
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            max_size: DEFAULT_MAX_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

// == Cache Options ==
/// Per-call overrides. Unset fields fall back to the cache's `CacheConfig`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub max_age: Option<Duration>,
    pub max_size: Option<usize>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }
}
