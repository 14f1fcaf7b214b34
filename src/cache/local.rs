//! Local Cache Module
//!
//! Bounded, process-local cache with strict LRU eviction and no TTL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{Cache, CacheStats, LruTracker};
use crate::error::Result;

#[derive(Debug)]
struct Inner {
    entries: HashMap<String, Vec<u8>>,
    lru: LruTracker,
    stats: CacheStats,
}

// == Local Cache ==
/// Fixed-capacity LRU cache guarded by a single lock.
///
/// Every hit promotes the entry to most recently used; inserting a new key at
/// capacity evicts exactly one entry, the least recently used. Entries never
/// expire on their own.
#[derive(Debug)]
pub struct LocalCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl LocalCache {
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                lru: LruTracker::with_capacity(capacity),
                stats: CacheStats::with_capacity(capacity),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the hit/miss/eviction counters.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }
}

#[async_trait]
impl Cache for LocalCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut inner = self.inner.lock().await;
        let value = inner.entries.get(key).cloned();
        if value.is_some() {
            inner.lru.touch(key);
        }
        inner.stats.record_lookup(value.is_some());
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], _ttl: Option<Duration>) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let is_overwrite = inner.entries.contains_key(key);
        if !is_overwrite && inner.entries.len() >= self.capacity {
            if let Some(evicted) = inner.lru.evict_oldest() {
                inner.entries.remove(&evicted);
                inner.stats.record_eviction();
                debug!(cache_key = %evicted, "Local cache entry evicted");
            }
        }

        inner.entries.insert(key.to_string(), value.to_vec());
        inner.lru.touch(key);
        let count = inner.entries.len();
        inner.stats.set_total_entries(count);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.entries.remove(key).is_some() {
            inner.lru.remove(key);
        }
        let count = inner.entries.len();
        inner.stats.set_total_entries(count);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.lru.clear();
        inner.stats.set_total_entries(0);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local-lru"
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = LocalCache::new(4);

        cache.set("league-options:1", b"[]", None).await.unwrap();

        assert_eq!(cache.get("league-options:1").await.unwrap(), Some(b"[]".to_vec()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = LocalCache::new(4);
        assert_eq!(cache.get("nope").await.unwrap(), None);
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_entry() {
        let cache = LocalCache::new(4);

        cache.set("k", b"v1", None).await.unwrap();
        cache.set("k", b"v2", None).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(b"v2".to_vec()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_eviction_of_oldest_on_capacity() {
        let cache = LocalCache::new(3);

        cache.set("k1", b"1", None).await.unwrap();
        cache.set("k2", b"2", None).await.unwrap();
        cache.set("k3", b"3", None).await.unwrap();
        cache.set("k4", b"4", None).await.unwrap();

        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.get("k1").await.unwrap(), None);
        assert!(cache.get("k4").await.unwrap().is_some());
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_get_promotes_entry() {
        let cache = LocalCache::new(3);

        cache.set("k1", b"1", None).await.unwrap();
        cache.set("k2", b"2", None).await.unwrap();
        cache.set("k3", b"3", None).await.unwrap();

        // k1 becomes most recent, so k2 is now the victim
        cache.get("k1").await.unwrap();
        cache.set("k4", b"4", None).await.unwrap();

        assert!(cache.get("k1").await.unwrap().is_some());
        assert_eq!(cache.get("k2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_at_capacity_does_not_evict() {
        let cache = LocalCache::new(2);

        cache.set("k1", b"1", None).await.unwrap();
        cache.set("k2", b"2", None).await.unwrap();
        cache.set("k1", b"one", None).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_ttl_is_ignored() {
        let cache = LocalCache::new(2);

        cache.set("k", b"v", Some(Duration::from_millis(1))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache = LocalCache::new(4);

        cache.set("a", b"1", None).await.unwrap();
        cache.set("b", b"2", None).await.unwrap();
        cache.delete("a").await.unwrap();
        cache.delete("missing").await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.len().await, 1);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let cache = LocalCache::new(0);
        assert_eq!(cache.capacity(), 1);

        cache.set("a", b"1", None).await.unwrap();
        cache.set("b", b"2", None).await.unwrap();
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_writers_respect_capacity() {
        let cache = Arc::new(LocalCache::new(16));

        let mut handles = Vec::new();
        for worker in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    let key = format!("w{}-{}", worker, i);
                    cache.set(&key, key.as_bytes(), None).await.unwrap();
                    let _ = cache.get(&key).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len().await, 16);
        let stats = cache.stats().await;
        assert_eq!(stats.evictions, 8 * 50 - 16);
    }
}
