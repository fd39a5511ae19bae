//! Key Pattern Module
//!
//! Matchers used to invalidate a family of related keys at once.

use regex::Regex;

use crate::error::Result;

// == Key Pattern ==
/// Selects keys for bulk invalidation.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Matches keys containing the given text
    Substring(String),
    /// Matches keys the expression finds a match in (unanchored)
    Regex(Regex),
}

impl KeyPattern {
    /// Creates a substring matcher.
    pub fn substring(text: impl Into<String>) -> Self {
        KeyPattern::Substring(text.into())
    }

    /// Compiles a regular expression matcher.
    ///
    /// Returns `CacheError::InvalidPattern` if the expression does not compile.
    pub fn regex(expression: &str) -> Result<Self> {
        Ok(KeyPattern::Regex(Regex::new(expression)?))
    }

    /// Returns true if `key` belongs to this pattern's family.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Substring(text) => key.contains(text.as_str()),
            KeyPattern::Regex(regex) => regex.is_match(key),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(text: &str) -> Self {
        KeyPattern::substring(text)
    }
}

impl From<String> for KeyPattern {
    fn from(text: String) -> Self {
        KeyPattern::Substring(text)
    }
}

impl From<Regex> for KeyPattern {
    fn from(regex: Regex) -> Self {
        KeyPattern::Regex(regex)
    }
}
