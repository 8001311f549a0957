//! Synthetic ingestion feed.
//!
//! Drives the tracker with observations sampled from a fixed origin pool so
//! the map shows activity without a live upstream source. Production
//! deployments disable this and push real origins through `POST /api/observe`.

use crate::config::FeedConfig;
use pulsemap_tracker::OriginTracker;
use rand::seq::SliceRandom;
use tokio::time::{sleep, Duration};

/// Runs the synthetic feed until the task is aborted.
///
/// Returns immediately when the feed is disabled or the origin pool is empty.
pub async fn run_feed(tracker: OriginTracker, config: FeedConfig) {
    if !config.enabled {
        tracing::info!("synthetic feed disabled");
        return;
    }
    if config.origins.is_empty() {
        tracing::warn!("synthetic feed enabled but origin pool is empty, not starting");
        return;
    }

    // A zero interval would spin the loop flat out.
    let interval = Duration::from_millis(config.interval_ms.max(1));

    tracing::info!(
        interval_ms = interval.as_millis() as u64,
        pool_size = config.origins.len(),
        "starting synthetic feed"
    );

    loop {
        sleep(interval).await;

        // ThreadRng is not Send; sample before the next await point.
        let origin = config
            .origins
            .choose(&mut rand::thread_rng())
            .cloned();

        if let Some(origin) = origin {
            tracker.observe(&origin);
            tracing::trace!(origin = %origin, "feed observation");
        }
    }
}
