//! In-process TTL Cache
//!
//! Shared-strategy cache for single-instance deployments and tests. Mirrors
//! the Redis backend: every entry carries an expiry fixed at write time and a
//! read past that expiry is a miss, whether or not the entry has been swept yet.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::entry::now_ms;
use crate::cache::{Cache, CacheEntry};
use crate::error::Result;

#[derive(Debug)]
pub struct MemoryTtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Applied when a caller stores without an explicit TTL
    default_ttl: Duration,
}

impl MemoryTtlCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // == Cleanup Expired ==
    /// Physically removes expired entries. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = now_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

#[async_trait]
impl Cache for MemoryTtlCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value.to_vec(), ttl.unwrap_or(self.default_ttl));
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory-ttl"
    }
}
