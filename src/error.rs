//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// Producer failures are never wrapped in this type: `get_or_compute`
/// returns the producer's own error unchanged.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key is absent or its entry has expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalidation pattern is not a valid regular expression
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration or per-call override is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Key Validation ==
/// Rejects empty keys.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}
