//! Cache Module
//!
//! Pluggable key/value caching behind one narrow contract. Two strategies sit
//! behind [`Cache`]:
//! - a bounded, process-local LRU ([`LocalCache`]) for small, hot lookups
//! - a shared TTL cache ([`RedisCache`], or [`MemoryTtlCache`] in a single process)
//!   for rendered calendars and option lists
//!
//! [`TieredCache`] layers the local cache in front of a shared one and
//! [`NullCache`] is the degraded "no cache" mode.

mod entry;
mod local;
mod lru;
mod redis_store;
mod stats;
mod tiered;
mod ttl;

#[cfg(test)]
mod property_tests;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use entry::CacheEntry;
pub use local::LocalCache;
pub use lru::LruTracker;
pub use redis_store::RedisCache;
pub use stats::CacheStats;
pub use tiered::TieredCache;
pub use ttl::MemoryTtlCache;

// == Cache Contract ==
/// Byte-oriented key/value cache, safe for concurrent use.
///
/// `ttl` is honoured by expiring strategies and ignored by the bounded LRU,
/// whose entries live until evicted by capacity pressure or cleared.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the cached value, or `None` on a miss (absent or expired).
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a value, replacing any previous one under the same key.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Removes a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every entry owned by this cache.
    async fn clear(&self) -> Result<()>;

    /// Short backend name for logs and the stats endpoint.
    fn name(&self) -> &'static str;
}

// == Null Cache ==
/// Always-miss cache used when no shared backend could be constructed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl Cache for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

// == Cache Keys ==
/// Namespaced cache keys, one variant per artifact class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Selectable games list
    AllGames,
    /// League option list for a game
    LeagueOptions(i32),
    /// Team option list for a game
    TeamOptions(i32),
    /// Rendered calendar for an export hash
    Calendar(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllGames => write!(f, "data:all-games"),
            CacheKey::LeagueOptions(game_id) => write!(f, "data:league-options:{}", game_id),
            CacheKey::TeamOptions(game_id) => write!(f, "data:team-options:{}", game_id),
            CacheKey::Calendar(hash) => write!(f, "ics:{}", hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_namespaced() {
        assert_eq!(CacheKey::AllGames.to_string(), "data:all-games");
        assert_eq!(CacheKey::LeagueOptions(4).to_string(), "data:league-options:4");
        assert_eq!(CacheKey::TeamOptions(4).to_string(), "data:team-options:4");
        assert_eq!(
            CacheKey::Calendar("0123456789abcdef".to_string()).to_string(),
            "ics:0123456789abcdef"
        );
        assert_ne!(
            CacheKey::LeagueOptions(4).to_string(),
            CacheKey::TeamOptions(4).to_string()
        );
    }

    #[tokio::test]
    async fn test_null_cache_always_misses() {
        let cache = NullCache;
        cache.set("k", b"v", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.delete("k").await.is_ok());
        assert!(cache.clear().await.is_ok());
    }
}
