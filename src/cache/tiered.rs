//! Tiered Cache Module
//!
//! Process-local LRU in front of a shared TTL cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{Cache, LocalCache};
use crate::error::Result;

/// Two-tier cache: reads try the local LRU first, then the shared cache.
///
/// A shared hit is copied into the local tier. Writes go to both tiers and
/// invalidation removes from both. Failures of the shared tier degrade to a
/// miss instead of failing the lookup.
pub struct TieredCache {
    local: Arc<LocalCache>,
    shared: Arc<dyn Cache>,
}

impl TieredCache {
    pub fn new(local: Arc<LocalCache>, shared: Arc<dyn Cache>) -> Self {
        Self { local, shared }
    }

    pub fn local(&self) -> &Arc<LocalCache> {
        &self.local
    }

    pub fn shared(&self) -> &Arc<dyn Cache> {
        &self.shared
    }
}

#[async_trait]
impl Cache for TieredCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.local.get(key).await? {
            debug!(cache_key = %key, tier = "local", "Tiered cache hit");
            return Ok(Some(value));
        }

        match self.shared.get(key).await {
            Ok(Some(value)) => {
                debug!(cache_key = %key, tier = self.shared.name(), "Tiered cache hit");
                self.local.set(key, &value, None).await?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(cache_key = %key, error = %err, "Shared cache read failed, treating as miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        self.local.set(key, value, ttl).await?;
        self.shared.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.local.delete(key).await?;
        self.shared.delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.local.clear().await?;
        self.shared.clear().await
    }

    fn name(&self) -> &'static str {
        "tiered"
    }
}
