//! Memo Cache demo
//!
//! Runs a simulated workload of slow profile lookups through the cache and
//! logs its statistics, so the expiry, eviction and invalidation behaviour can
//! be watched with `RUST_LOG=memo_cache=debug`.

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_cache::{CacheConfig, MemoCache};

/// Number of distinct users the workload cycles through
const USER_COUNT: u64 = 12;

/// Delay between simulated requests
const REQUEST_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Serialize)]
struct Profile {
    id: u64,
    name: String,
}

/// Main entry point for the Memo Cache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache with its expiry sweep
/// 4. Serve simulated requests until SIGINT/SIGTERM
/// 5. Stop the sweep and log final statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memo Cache demo");

    let config = CacheConfig::from_env();
    info!(
        max_age_secs = config.max_age.as_secs(),
        max_size = config.max_size,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Configuration loaded"
    );

    let cache: MemoCache<Profile> =
        MemoCache::with_sweeper(config).context("invalid cache configuration")?;

    tokio::select! {
        result = run_workload(&cache) => result?,
        _ = shutdown_signal() => {}
    }

    cache.shutdown();
    let stats = cache.stats().await;
    info!(
        size = stats.size,
        hit_rate = stats.hit_rate(),
        approx_total_bytes = stats.approx_total_bytes,
        "Final cache statistics"
    );

    info!("Shutdown complete");
    Ok(())
}

/// Issues requests for a rotating set of users forever, invalidating one
/// user's entries every so often and logging stats periodically.
async fn run_workload(cache: &MemoCache<Profile>) -> anyhow::Result<()> {
    let mut request: u64 = 0;

    loop {
        // Skewed towards low ids so some keys are hot
        let id = (request * request) % USER_COUNT;
        let key = format!("user:{}:profile", id);

        let profile = cache
            .get_or_compute(&key, || fetch_profile(id))
            .await
            .with_context(|| format!("lookup for {} failed", key))?;
        info!(key = %key, name = %profile.name, "Served profile");

        if request % 25 == 24 {
            let removed = cache.invalidate_pattern(format!("user:{}:", id)).await;
            info!(id, removed, "Invalidated user");
        }

        if request % 50 == 49 {
            let stats = cache.stats().await;
            info!(stats = %serde_json::to_string(&stats)?, "Cache statistics");
        }

        request += 1;
        tokio::time::sleep(REQUEST_INTERVAL).await;
    }
}

/// Stand-in for a slow upstream lookup.
async fn fetch_profile(id: u64) -> anyhow::Result<Profile> {
    tokio::time::sleep(Duration::from_millis(150)).await;
    Ok(Profile {
        id,
        name: format!("User {}", id),
    })
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(%err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(%err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
