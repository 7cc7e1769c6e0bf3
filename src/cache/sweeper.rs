use super::ResponseCache;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

/// Periodically deletes entries older than `max_age`.
///
/// Only bounds storage growth; reads already ignore stale entries.
pub fn spawn_sweeper(cache: ResponseCache, every: Duration, max_age: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_secs(1));
    info!(
        "Starting {} cache sweeper (every {:?}, max age {:?})",
        cache.backend(),
        every,
        max_age
    );

    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            match cache.sweep_expired(max_age).await {
                0 => debug!("Cache sweep: nothing to remove"),
                n => info!("Cache sweep: removed {} expired entries", n),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::ManualClock;
    use crate::cache::{CacheKey, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let clock = ManualClock::new(0);
        let cache = ResponseCache::new(Arc::new(MemoryStore::with_clock(clock.clone())));
        cache.set_cached_data(&CacheKey::new("a"), &json!(1)).await;
        clock.advance(10_000);

        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(60), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.stats().await.entries, 0);

        cache.set_cached_data(&CacheKey::new("b"), &json!(2)).await;
        clock.advance(10_000);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cache.stats().await.entries, 1, "second sweep not due yet");

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(cache.stats().await.entries, 0);

        handle.abort();
    }
}
