//! TTL response cache shared by every content command.
//!
//! Entries remember when they were stored; freshness is decided at read time
//! against a max age supplied by the caller, so one store can serve domains
//! with very different TTLs.

mod disk;
mod key;
mod memory;
pub mod sweeper;

pub use disk::DiskStore;
pub use key::{sanitize_key, CacheKey};
pub use memory::MemoryStore;

use crate::config::CacheConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Disk,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(CacheBackend::Memory),
            "disk" | "file" => Ok(CacheBackend::Disk),
            other => Err(anyhow::anyhow!(
                "Unknown cache backend '{}' (expected 'memory' or 'disk')",
                other
            )),
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::Memory => f.write_str("memory"),
            CacheBackend::Disk => f.write_str("disk"),
        }
    }
}

/// A stored value and the moment it was stored.
///
/// Never mutated in place; a re-insert replaces the whole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: i64,
}

impl CacheEntry {
    pub fn new(value: Value, stored_at: i64) -> Self {
        Self { value, stored_at }
    }

    /// An entry exactly `max_age` old is still fresh.
    pub fn is_expired(&self, now: i64, max_age: Duration) -> bool {
        now.saturating_sub(self.stored_at) > duration_millis(max_age)
    }
}

fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Backing strategy for the response cache.
///
/// Implementations never surface I/O errors: a failed read is a miss and a
/// failed write is reported as `false`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey, max_age: Duration) -> Option<Value>;
    async fn set(&self, key: &CacheKey, value: &Value) -> bool;
    /// Deletes entries older than `max_age`, returning how many were removed.
    async fn sweep_expired(&self, max_age: Duration) -> usize;
    async fn entry_count(&self) -> usize;
    async fn clear(&self) -> usize;
    fn backend(&self) -> CacheBackend;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub backend: CacheBackend,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            None
        } else {
            Some(self.hits as f64 / total as f64)
        }
    }
}

/// Process-wide handle to the configured store. Cloning is cheap.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn from_config(config: &CacheConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn CacheStore> = match config.backend {
            CacheBackend::Memory => Arc::new(MemoryStore::new()),
            CacheBackend::Disk => Arc::new(DiskStore::open(&config.dir).await.map_err(|e| {
                anyhow::anyhow!(
                    "Failed to open cache directory {}: {}",
                    config.dir.display(),
                    e
                )
            })?),
        };
        info!("Response cache using {} backend", store.backend());
        Ok(Self::new(store))
    }

    pub async fn get_cached_data(&self, key: &CacheKey, max_age: Duration) -> Option<Value> {
        let value = self.store.get(key, max_age).await;
        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    pub async fn set_cached_data(&self, key: &CacheKey, value: &Value) -> bool {
        self.store.set(key, value).await
    }

    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        self.store.sweep_expired(max_age).await
    }

    pub async fn clear(&self) -> usize {
        self.store.clear().await
    }

    pub fn backend(&self) -> CacheBackend {
        self.store.backend()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            backend: self.store.backend(),
            entries: self.store.entry_count().await,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Clock;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    /// Clock that only moves when told to.
    pub struct ManualClock(AtomicI64);

    impl ManualClock {
        pub fn new(start: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(start)))
        }

        pub fn advance(&self, millis: i64) {
            self.0.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ManualClock;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_expiry_boundary() {
        let entry = CacheEntry::new(json!(1), 1_000);
        let max_age = Duration::from_millis(500);
        assert!(!entry.is_expired(1_000, max_age));
        assert!(!entry.is_expired(1_500, max_age));
        assert!(entry.is_expired(1_501, max_age));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert_eq!(" Disk ".parse::<CacheBackend>().unwrap(), CacheBackend::Disk);
        assert!("redis".parse::<CacheBackend>().is_err());
        assert_eq!(CacheBackend::Disk.to_string(), "disk");
    }

    #[tokio::test]
    async fn test_response_cache_counts_hits_and_misses() {
        let clock = ManualClock::new(0);
        let cache = ResponseCache::new(Arc::new(MemoryStore::with_clock(clock.clone())));
        let key = CacheKey::new("movie_inception");
        let max_age = Duration::from_secs(60);

        assert!(cache.get_cached_data(&key, max_age).await.is_none());
        assert!(cache.set_cached_data(&key, &json!({"id": 27205})).await);
        assert_eq!(
            cache.get_cached_data(&key, max_age).await,
            Some(json!({"id": 27205}))
        );

        let stats = cache.stats().await;
        assert_eq!(stats.backend, CacheBackend::Memory);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), Some(0.5));
    }

    #[tokio::test]
    async fn test_end_to_end_anime_scenario() {
        let dir = tempfile::TempDir::new().unwrap();
        let clock = ManualClock::new(1_700_000_000_000);
        let store = DiskStore::open(dir.path()).await.unwrap().with_clock(clock.clone());
        let cache = ResponseCache::new(Arc::new(store));

        let key = CacheKey::new("anime_ q=naruto&limit=10");
        assert_eq!(key.as_str(), "anime__q_naruto_limit_10");

        let payload = json!({"results": ["Naruto"]});
        assert!(cache.set_cached_data(&key, &payload).await);

        let max_age = Duration::from_millis(3_600_000);
        assert_eq!(cache.get_cached_data(&key, max_age).await, Some(payload));

        clock.advance(3_600_001);
        assert!(cache.get_cached_data(&key, max_age).await.is_none());
    }
}
