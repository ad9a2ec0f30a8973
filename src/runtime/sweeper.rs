use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::HistoryStore;

/// Periodically drop sessions idle for longer than `ttl`
///
/// The caller owns the returned handle and aborts it on shutdown.
pub fn spawn_idle_sweeper(
    store: Arc<HistoryStore>,
    ttl: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately; nothing can be idle yet
        interval.tick().await;

        loop {
            interval.tick().await;
            let evicted = store.evict_idle(ttl);
            debug!(evicted, live = store.len(), "Idle session sweep");
        }
    })
}
