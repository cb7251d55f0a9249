//! Sweep Task
//!
//! Background task that periodically purges expired tickers and drops idle
//! rate-limit buckets. Expiry is still enforced on read; the sweep only keeps
//! memory bounded for keys nobody asks for again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::rate_limit::RateLimiter;
use crate::service::MarketDataService;

/// Spawns the sweep loop.
///
/// The first sweep runs one `interval` after start. Abort the returned handle
/// during graceful shutdown.
pub fn spawn_sweep_task(
    service: Arc<MarketDataService>,
    limiter: Arc<RateLimiter>,
    interval: Duration,
    bucket_max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs_f64(),
            bucket_max_idle_secs = bucket_max_idle.as_secs(),
            "starting sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;
            sweep_once(&service, &limiter, bucket_max_idle);
        }
    })
}

/// One sweep pass. Returns (expired tickers purged, idle buckets dropped).
pub fn sweep_once(
    service: &MarketDataService,
    limiter: &RateLimiter,
    bucket_max_idle: Duration,
) -> (usize, usize) {
    let purged = service.purge_expired();
    let evicted = limiter.evict_idle(bucket_max_idle);

    if purged > 0 || evicted > 0 {
        info!(purged, evicted, "sweep removed stale state");
    } else {
        debug!("sweep found nothing to remove");
    }
    (purged, evicted)
}
