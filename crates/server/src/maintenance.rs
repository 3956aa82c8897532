//! Periodic cache maintenance, off the request path. Each tick evicts area
//! cache entries past the area TTL and popularity records past the
//! aggregation TTL, retrying transient storage failures with backoff —
//! both deletes are idempotent.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{info, warn};

use localscope_core::config::CacheConfig;
use localscope_db::repositories::{GeoCacheRepository, PopularityRepository};

const RETRY_BASE_DELAY_MS: u64 = 200;
const RETRY_ATTEMPTS: usize = 3;

pub fn spawn(
    cache: Arc<dyn GeoCacheRepository>,
    popularity: Arc<dyn PopularityRepository>,
    config: CacheConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.eviction_interval_secs));
        // the immediate first tick would race bootstrap; skip it
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_eviction_pass(cache.as_ref(), popularity.as_ref(), &config).await;
        }
    })
}

pub async fn run_eviction_pass(
    cache: &dyn GeoCacheRepository,
    popularity: &dyn PopularityRepository,
    config: &CacheConfig,
) {
    let strategy = || {
        ExponentialBackoff::from_millis(RETRY_BASE_DELAY_MS).map(jitter).take(RETRY_ATTEMPTS)
    };

    let area_cutoff = Utc::now() - chrono::Duration::hours(config.area_ttl_hours as i64);
    match Retry::spawn(strategy(), || cache.evict_expired(area_cutoff)).await {
        Ok(evicted) if evicted > 0 => {
            info!(event_name = "maintenance.cache_evicted", evicted, "expired cache entries removed");
        }
        Ok(_) => {}
        Err(error) => {
            warn!(
                event_name = "maintenance.cache_eviction_failed",
                error = %error,
                "cache eviction failed after retries"
            );
        }
    }

    let popularity_cutoff =
        Utc::now() - chrono::Duration::hours(config.popularity_ttl_hours as i64);
    match Retry::spawn(strategy(), || popularity.evict_stale(popularity_cutoff)).await {
        Ok(evicted) if evicted > 0 => {
            info!(
                event_name = "maintenance.popularity_evicted",
                evicted, "stale popularity records removed"
            );
        }
        Ok(_) => {}
        Err(error) => {
            warn!(
                event_name = "maintenance.popularity_eviction_failed",
                error = %error,
                "popularity eviction failed after retries"
            );
        }
    }
}
