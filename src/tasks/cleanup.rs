//! Sweep for the in-process shared cache.
//!
//! Expired calendars and option lists are already invisible to readers; the
//! sweep only gives their memory back.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::MemoryTtlCache;

/// Starts sweeping `cache` every `period_secs` seconds (at least one).
///
/// The first sweep runs one full period after start. Abort the returned
/// handle on shutdown.
pub fn spawn_cleanup_task(cache: Arc<MemoryTtlCache>, period_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(period_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately; nothing can have expired yet
        ticker.tick().await;
        info!(period_secs = period.as_secs(), "Shared cache sweep started");

        loop {
            ticker.tick().await;
            let dropped = cache.cleanup_expired().await;
            if dropped == 0 {
                debug!("Shared cache sweep found nothing to drop");
                continue;
            }
            let remaining = cache.len().await;
            info!(dropped, remaining, "Shared cache sweep");
        }
    })
}
