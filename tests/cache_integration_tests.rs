//! Integration Tests for the memoization cache
//!
//! Exercises the public `MemoCache` surface end to end: memoization, expiry,
//! eviction order, invalidation, statistics and the sweep lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use memo_cache::{CacheConfig, CacheError, CacheOptions, KeyPattern, MemoCache};
use tokio::time::advance;
use tokio_test::{assert_err, assert_ok};

// == Helper Functions ==

fn create_test_cache(max_size: usize) -> MemoCache<String> {
    MemoCache::new(CacheConfig::default().max_size(max_size)).unwrap()
}

async fn put(cache: &MemoCache<String>, key: &str) {
    assert_ok!(cache.set(key, format!("value-{}", key), None).await);
}

// == Memoization ==

#[tokio::test]
async fn test_fresh_value_served_without_producer() {
    let cache = create_test_cache(100);
    let calls = AtomicUsize::new(0);

    let producer = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, anyhow::Error>("computed".to_string())
    };

    let first = cache.get_or_compute("report:1", producer).await.unwrap();
    let second = cache.get_or_compute("report:1", producer).await.unwrap();

    assert_eq!(first, "computed");
    assert_eq!(second, "computed");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_value_triggers_recompute() {
    let cache = create_test_cache(100);
    let calls = AtomicUsize::new(0);
    let options = CacheOptions::new().max_age(Duration::from_millis(500));

    let producer = || async {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, anyhow::Error>(format!("v{}", n))
    };

    let first = cache
        .get_or_compute_with("k", producer, &options)
        .await
        .unwrap();
    advance(Duration::from_millis(500)).await;
    // Still fresh at exactly max_age
    let at_boundary = cache
        .get_or_compute_with("k", producer, &options)
        .await
        .unwrap();
    advance(Duration::from_millis(1)).await;
    let after = cache
        .get_or_compute_with("k", producer, &options)
        .await
        .unwrap();

    assert_eq!(first, "v0");
    assert_eq!(at_boundary, "v0");
    assert_eq!(after, "v1");
}

#[tokio::test]
async fn test_producer_error_propagates_unchanged() {
    #[derive(Debug, PartialEq)]
    enum LookupError {
        Upstream(u16),
        Cache(String),
    }

    impl From<CacheError> for LookupError {
        fn from(err: CacheError) -> Self {
            LookupError::Cache(err.to_string())
        }
    }

    let cache = create_test_cache(100);

    let result = cache
        .get_or_compute("k", || async { Err(LookupError::Upstream(503)) })
        .await;
    assert_eq!(result, Err(LookupError::Upstream(503)));
    assert!(!cache.has("k").await.unwrap());

    let result = cache
        .get_or_compute("", || async { Ok::<_, LookupError>("v".to_string()) })
        .await;
    assert!(matches!(result, Err(LookupError::Cache(_))));
}

// == set / get_only ==

#[tokio::test(start_paused = true)]
async fn test_set_then_get_only_until_expiry() {
    let cache = create_test_cache(100);

    assert_ok!(
        cache
            .set("k", "v1".to_string(), Some(Duration::from_millis(1000)))
            .await
    );
    assert_eq!(cache.get_only("k").await.unwrap(), "v1");

    advance(Duration::from_millis(1100)).await;

    let err = assert_err!(cache.get_only("k").await);
    assert!(matches!(err, CacheError::NotFound(_)));
    assert!(!cache.has("k").await.unwrap());
}

#[tokio::test]
async fn test_get_only_missing_key() {
    let cache = create_test_cache(100);

    let err = assert_err!(cache.get_only("never-set").await);
    assert!(matches!(err, CacheError::NotFound(ref key) if key == "never-set"));
}

// == Eviction ==

#[tokio::test(start_paused = true)]
async fn test_eviction_prefers_least_frequently_used() {
    let cache = create_test_cache(2);

    put(&cache, "A").await;
    advance(Duration::from_millis(1)).await;
    put(&cache, "B").await;
    advance(Duration::from_millis(1)).await;
    cache.get_only("A").await.unwrap();
    cache.get_only("A").await.unwrap();
    advance(Duration::from_millis(1)).await;
    put(&cache, "C").await;

    assert!(cache.has("A").await.unwrap());
    assert!(!cache.has("B").await.unwrap());
    assert!(cache.has("C").await.unwrap());

    let stats = cache.stats().await;
    assert_eq!(stats.size, 2);
    assert_eq!(stats.entry("A").map(|e| e.access_count), Some(3));
    assert_eq!(stats.counters.evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_eviction_tie_break_is_least_recently_used() {
    let cache = create_test_cache(2);

    put(&cache, "A").await;
    advance(Duration::from_millis(5)).await;
    put(&cache, "B").await;
    advance(Duration::from_millis(5)).await;
    put(&cache, "C").await;

    assert!(!cache.has("A").await.unwrap());
    assert!(cache.has("B").await.unwrap());
    assert!(cache.has("C").await.unwrap());
}

#[tokio::test]
async fn test_size_never_exceeds_max_size() {
    let cache = create_test_cache(5);

    for i in 0..50 {
        let key = format!("key:{}", i);
        cache
            .get_or_compute(&key, || async { Ok::<_, anyhow::Error>(key.clone()) })
            .await
            .unwrap();
        assert!(cache.len().await <= 5);
    }
}

#[tokio::test]
async fn test_overwrite_does_not_evict() {
    let cache = create_test_cache(2);

    put(&cache, "A").await;
    put(&cache, "B").await;
    assert_ok!(cache.set("B", "replaced".to_string(), None).await);

    assert_eq!(cache.len().await, 2);
    assert_eq!(cache.get_only("A").await.unwrap(), "value-A");
    assert_eq!(cache.get_only("B").await.unwrap(), "replaced");
}

// == Invalidation ==

#[tokio::test]
async fn test_invalidate_pattern_removes_exact_family() {
    let cache = create_test_cache(100);
    for key in ["user:42:profile", "user:42:posts", "team:7:user:42", "user:7:profile", "user:4:posts"] {
        put(&cache, key).await;
    }

    let removed = cache.invalidate_pattern("user:42").await;

    assert_eq!(removed, 3);
    assert_eq!(cache.len().await, 2);
    assert!(cache.has("user:7:profile").await.unwrap());
    assert!(cache.has("user:4:posts").await.unwrap());
    assert_eq!(cache.invalidate_pattern("user:42").await, 0);
}

#[tokio::test]
async fn test_invalidate_regex_pattern() {
    let cache = create_test_cache(100);
    for key in ["user:1:profile", "user:2:profile", "user:2:feed"] {
        put(&cache, key).await;
    }

    let pattern = KeyPattern::regex(r"^user:\d+:profile$").unwrap();
    assert_eq!(cache.invalidate_pattern(pattern).await, 2);
    assert!(cache.has("user:2:feed").await.unwrap());
}

// == clear / delete ==

#[tokio::test]
async fn test_clear_is_idempotent() {
    let cache = create_test_cache(100);
    put(&cache, "a").await;
    put(&cache, "b").await;

    cache.clear().await;
    assert_eq!(cache.stats().await.size, 0);

    cache.clear().await;
    assert_eq!(cache.stats().await.size, 0);
}

#[tokio::test]
async fn test_delete_reports_presence() {
    let cache = create_test_cache(100);
    put(&cache, "a").await;

    assert!(cache.delete("a").await.unwrap());
    assert!(!cache.delete("a").await.unwrap());
}

// == Statistics ==

#[tokio::test(start_paused = true)]
async fn test_stats_report() {
    let cache = create_test_cache(10);
    assert_ok!(cache.set("short", "ab".to_string(), None).await);
    assert_ok!(cache.set("long", "abcdef".to_string(), None).await);

    advance(Duration::from_secs(3)).await;
    cache.get_only("long").await.unwrap();
    let _ = cache.get_only("missing").await;

    let stats = cache.stats().await;
    assert_eq!(stats.size, 2);
    assert_eq!(stats.max_size, 10);
    assert_eq!(stats.counters.hits, 1);
    assert_eq!(stats.counters.misses, 1);
    assert_eq!(stats.hit_rate(), 0.5);

    let long = stats.entry("long").unwrap();
    assert_eq!(long.approx_bytes, 8);
    assert_eq!(long.access_count, 2);
    assert_eq!(long.age, Duration::from_secs(3));
    assert_eq!(stats.approx_total_bytes, 12);
}

// == Sweep ==

#[tokio::test(start_paused = true)]
async fn test_sweeper_reclaims_unread_entries() {
    let config = CacheConfig::default()
        .max_age(Duration::from_secs(2))
        .sweep_interval(Duration::from_secs(5));
    let cache: MemoCache<String> = MemoCache::with_sweeper(config).unwrap();

    put(&cache, "a").await;
    put(&cache, "b").await;
    assert_eq!(cache.len().await, 2);

    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(cache.len().await, 0);
    assert_eq!(cache.stats().await.counters.expirations, 2);
    cache.shutdown();
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let result = MemoCache::<String>::new(CacheConfig::default().max_size(0));
    assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
}
