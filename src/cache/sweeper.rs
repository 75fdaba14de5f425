//! Periodic eviction of expired pages.
//!
//! Reads already treat expired entries as misses; the sweeper only reclaims
//! memory held by pages nobody requests again.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

use super::store::PageCache;

/// Spawn a task that purges expired entries every `interval`.
///
/// The first tick fires one full interval after spawning. Abort the returned
/// handle to stop sweeping.
pub fn spawn_sweeper<V>(cache: Arc<PageCache<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip the first immediate tick
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(
                    cache = "page",
                    purged,
                    remaining = cache.len(),
                    "swept expired pages"
                );
            }
        }
    })
}
