//! Memo Cache - A time-aware in-process memoization cache
//!
//! Memoizes the results of expensive async lookups with expiry, size-bounded
//! LFU eviction, pattern invalidation and usage statistics.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, KeyPattern, MemoCache};
pub use config::{CacheConfig, CacheOptions};
pub use error::{CacheError, Result};
