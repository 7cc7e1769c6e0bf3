use super::{CacheBackend, CacheEntry, CacheKey, CacheStore, Clock, SystemClock};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Volatile store: a map that lives as long as the process.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey, max_age: Duration) -> Option<Value> {
        let now = self.clock.now_millis();
        let mut entries = self.entries();
        let entry = entries.get(key.as_str())?;
        if entry.is_expired(now, max_age) {
            debug!("Memory cache: evicting expired entry {}", key);
            entries.remove(key.as_str());
            return None;
        }
        Some(entry.value.clone())
    }

    async fn set(&self, key: &CacheKey, value: &Value) -> bool {
        if key.is_empty() {
            return false;
        }
        let entry = CacheEntry::new(value.clone(), self.clock.now_millis());
        self.entries().insert(key.as_str().to_string(), entry);
        true
    }

    async fn sweep_expired(&self, max_age: Duration) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, max_age));
        before - entries.len()
    }

    async fn entry_count(&self) -> usize {
        self.entries().len()
    }

    async fn clear(&self) -> usize {
        let mut entries = self.entries();
        let count = entries.len();
        entries.clear();
        count
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::ManualClock;
    use serde_json::json;

    fn store() -> (MemoryStore, Arc<ManualClock>) {
        let clock = ManualClock::new(1_000_000);
        (MemoryStore::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_fresh_value_returned_for_any_max_age() {
        let (store, _clock) = store();
        let key = CacheKey::new("book_dune");
        assert!(store.set(&key, &json!({"title": "Dune"})).await);

        for max_age in [0, 1, 60_000, u64::MAX] {
            assert_eq!(
                store.get(&key, Duration::from_millis(max_age)).await,
                Some(json!({"title": "Dune"}))
            );
        }
    }

    #[tokio::test]
    async fn test_expired_value_is_absent_and_evicted() {
        let (store, clock) = store();
        let key = CacheKey::new("steam_730");
        store.set(&key, &json!("cs2")).await;

        clock.advance(1_001);
        assert!(store.get(&key, Duration::from_secs(1)).await.is_none());
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_timestamp() {
        let (store, clock) = store();
        let key = CacheKey::new("movie_alien");
        store.set(&key, &json!("v1")).await;

        clock.advance(900);
        store.set(&key, &json!("v2")).await;

        // 1500ms after the first write but only 600ms after the second.
        clock.advance(600);
        assert_eq!(
            store.get(&key, Duration::from_secs(1)).await,
            Some(json!("v2"))
        );
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let (store, _clock) = store();
        let k1 = CacheKey::new("anime_1");
        let k2 = CacheKey::new("anime_2");
        store.set(&k1, &json!(1)).await;

        assert!(store.get(&k2, Duration::from_secs(60)).await.is_none());
        store.set(&k2, &json!(2)).await;
        assert_eq!(store.get(&k1, Duration::from_secs(60)).await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_old_entries() {
        let (store, clock) = store();
        store.set(&CacheKey::new("old"), &json!(1)).await;
        clock.advance(5_000);
        store.set(&CacheKey::new("new"), &json!(2)).await;
        clock.advance(1_000);

        let removed = store.sweep_expired(Duration::from_secs(3)).await;
        assert_eq!(removed, 1);
        assert!(store.get(&CacheKey::new("new"), Duration::from_secs(3)).await.is_some());
        assert_eq!(store.clear().await, 1);
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let (store, _clock) = store();
        assert!(!store.set(&CacheKey::new(""), &json!(1)).await);
        assert_eq!(store.entry_count().await, 0);
    }
}
