//! Eviction Module
//!
//! Picks the least valuable entry when the table is over capacity.
//!
//! Frequency comes first: the entry with the lowest `access_count` loses.
//! Among equally used entries the one read longest ago loses, so this is LFU
//! with an LRU tie-break rather than plain LRU.

use std::cmp::Ordering;

use crate::cache::CacheEntry;

// == Compare ==
/// Orders two entries from least to most valuable.
///
/// Falls back to `created_at` and then the key so the choice is deterministic
/// even when timestamps collide.
fn compare<T>(a: (&String, &CacheEntry<T>), b: (&String, &CacheEntry<T>)) -> Ordering {
    let (key_a, entry_a) = a;
    let (key_b, entry_b) = b;

    entry_a
        .access_count
        .cmp(&entry_b.access_count)
        .then_with(|| entry_a.last_accessed_at.cmp(&entry_b.last_accessed_at))
        .then_with(|| entry_a.created_at.cmp(&entry_b.created_at))
        .then_with(|| key_a.cmp(key_b))
}

// == Select Victim ==
/// Returns the key of the entry to evict, or None if there are no entries.
pub fn select_victim<'a, T, I>(entries: I) -> Option<String>
where
    T: 'a,
    I: IntoIterator<Item = (&'a String, &'a CacheEntry<T>)>,
{
    entries
        .into_iter()
        .min_by(|a, b| compare(*a, *b))
        .map(|(key, _)| key.clone())
}
