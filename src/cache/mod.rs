//! Cache Module
//!
//! In-process memoization with time-based expiry, LFU eviction, pattern
//! invalidation and usage statistics.

mod engine;
mod entry;
mod eviction;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use engine::MemoCache;
pub use entry::CacheEntry;
pub use eviction::select_victim;
pub use pattern::KeyPattern;
pub use stats::{CacheCounters, CacheStats, EntryStats};
pub use store::CacheStore;
