//! Redis Cache Module
//!
//! Shared TTL cache backed by Redis. Expiry is delegated to Redis itself
//! (`SET ... EX`), so a read past expiry is a miss without any work here.
//! Keys are namespaced with a configurable prefix so the instance can be
//! shared with other applications.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::error::{AppError, Result};

/// Upper bound on establishing the initial connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis refuses `EX 0`, so sub-second TTLs are rounded up.
const MIN_TTL_SECS: u64 = 1;

/// Keys requested per `SCAN` round trip when clearing.
const SCAN_BATCH: usize = 100;

pub struct RedisCache {
    connection: ConnectionManager,
    prefix: String,
    default_ttl: Duration,
}

impl RedisCache {
    // == Constructor ==
    /// Connects to Redis and verifies the connection with `PING`.
    ///
    /// Fails fast (bounded by a connect timeout) so callers can fall back to
    /// running without a shared cache.
    pub async fn connect(url: &str, prefix: &str, default_ttl: Duration) -> Result<Self> {
        let client = Client::open(url)?;

        let mut connection = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| AppError::Cache(format!("timed out connecting to {}", url)))??;

        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await?;

        info!(prefix = %prefix, "Redis cache initialized");

        Ok(Self {
            connection,
            prefix: prefix.to_string(),
            default_ttl,
        })
    }

    /// Apply the prefix to a key.
    fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(self.prefixed_key(key))
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let ttl_secs = ttl
            .unwrap_or(self.default_ttl)
            .as_secs()
            .max(MIN_TTL_SECS);
        let mut conn = self.connection.clone();
        redis::cmd("SET")
            .arg(self.prefixed_key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(cache_key = %key, ttl_secs, "Stored in Redis");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("DEL")
            .arg(self.prefixed_key(key))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Deletes every key under this cache's prefix.
    async fn clear(&self) -> Result<()> {
        let pattern = format!("{}*", self.prefix);
        let mut conn = self.connection.clone();
        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        if !keys.is_empty() {
            redis::cmd("DEL")
                .arg(&keys)
                .query_async::<_, ()>(&mut conn)
                .await?;
        }

        info!(removed = keys.len(), "Redis cache cleared");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
