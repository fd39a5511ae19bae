//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries so they
//! do not hold memory until someone reads them again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps, so at most one sweep from this task is ever running. The
/// write lock is held only while scanning and deleting.
///
/// # Arguments
/// * `store` - Shared reference to the entry table
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task; aborting it stops the sweep.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::<String>::new(CacheConfig::default())));
/// let handle = spawn_sweep_task(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task<T>(store: Arc<RwLock<CacheStore<T>>>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting expiry sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut guard = store.write().await;
                let removed = guard.purge_expired();
                guard.record_sweep();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "Expiry sweep removed entries");
            } else {
                debug!(remaining, "Expiry sweep found nothing to remove");
            }
        }
    })
}
