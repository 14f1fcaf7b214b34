//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which shared TTL cache backs calendar artifacts and option lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// External Redis instance shared across server processes
    Redis,
    /// In-process TTL map, swept by a background task
    Memory,
    /// Every lookup misses; every request recomputes from the data source
    None,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            "none" | "off" => Ok(CacheBackend::None),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// PostgreSQL connection string
    pub database_url: String,
    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
    /// Shared cache backend selection
    pub cache_backend: CacheBackend,
    /// Redis connection string
    pub redis_url: String,
    /// Prefix applied to every Redis key
    pub redis_key_prefix: String,
    /// Capacity of the process-local LRU cache
    pub local_cache_capacity: usize,
    /// TTL in seconds for rendered calendars
    pub ics_cache_ttl: u64,
    /// TTL in seconds for option lists and the games list
    pub data_cache_ttl: u64,
    /// Sweep interval in seconds for the in-process TTL backend
    pub cleanup_interval: u64,
    /// Target number of matches in a preview
    pub preview_limit: usize,
    /// How many days of past matches a calendar feed carries
    pub calendar_lookback_days: i64,
    /// Base URL used to build export links
    pub public_base_url: String,
    /// Seconds in-flight requests get to drain on shutdown
    pub shutdown_grace_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `DATABASE_URL` - PostgreSQL URL (default: postgres://localhost:5432/esports)
    /// - `DB_MAX_CONNECTIONS` - Pool size (default: 10)
    /// - `CACHE_BACKEND` - `redis`, `memory` or `none` (default: redis)
    /// - `REDIS_URL` - Redis URL (default: redis://redis:6379)
    /// - `REDIS_KEY_PREFIX` - Key namespace (default: esportscalendar:)
    /// - `LOCAL_CACHE_CAPACITY` - Local LRU entries (default: 32)
    /// - `ICS_CACHE_TTL` - Calendar TTL in seconds (default: 3600)
    /// - `DATA_CACHE_TTL` - Option list TTL in seconds (default: 1800)
    /// - `CLEANUP_INTERVAL` - TTL sweep frequency in seconds (default: 60)
    /// - `PREVIEW_LIMIT` - Preview target size (default: 10)
    /// - `CALENDAR_LOOKBACK_DAYS` - Past window of calendar feeds (default: 14)
    /// - `PUBLIC_BASE_URL` - Export link base (default: https://esportscalendar.app)
    /// - `SHUTDOWN_GRACE_SECS` - Drain period on shutdown (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.db_max_connections),
            cache_backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.cache_backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.redis_key_prefix),
            local_cache_capacity: parse_var("LOCAL_CACHE_CAPACITY")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.local_cache_capacity),
            ics_cache_ttl: parse_var("ICS_CACHE_TTL").unwrap_or(defaults.ics_cache_ttl),
            data_cache_ttl: parse_var("DATA_CACHE_TTL").unwrap_or(defaults.data_cache_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            preview_limit: parse_var("PREVIEW_LIMIT").unwrap_or(defaults.preview_limit),
            calendar_lookback_days: parse_var("CALENDAR_LOOKBACK_DAYS")
                .unwrap_or(defaults.calendar_lookback_days),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            shutdown_grace_secs: parse_var("SHUTDOWN_GRACE_SECS")
                .unwrap_or(defaults.shutdown_grace_secs),
        }
    }

    /// TTL applied to rendered calendars in the shared cache.
    pub fn ics_ttl(&self) -> Duration {
        Duration::from_secs(self.ics_cache_ttl)
    }

    /// TTL applied to option lists in the shared cache.
    pub fn data_ttl(&self) -> Duration {
        Duration::from_secs(self.data_cache_ttl)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            database_url: "postgres://localhost:5432/esports".to_string(),
            db_max_connections: 10,
            cache_backend: CacheBackend::Redis,
            redis_url: "redis://redis:6379".to_string(),
            redis_key_prefix: "esportscalendar:".to_string(),
            local_cache_capacity: 32,
            ics_cache_ttl: 3600,
            data_cache_ttl: 1800,
            cleanup_interval: 60,
            preview_limit: 10,
            calendar_lookback_days: 14,
            public_base_url: "https://esportscalendar.app".to_string(),
            shutdown_grace_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.local_cache_capacity, 32);
        assert_eq!(config.ics_ttl(), Duration::from_secs(3600));
        assert_eq!(config.data_ttl(), Duration::from_secs(1800));
        assert_eq!(config.preview_limit, 10);
        assert_eq!(config.cache_backend, CacheBackend::Redis);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("LOCAL_CACHE_CAPACITY");
        env::remove_var("PREVIEW_LIMIT");
        env::remove_var("CALENDAR_LOOKBACK_DAYS");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.local_cache_capacity, 32);
        assert_eq!(config.preview_limit, 10);
        assert_eq!(config.calendar_lookback_days, 14);
    }

    #[test]
    fn test_cache_backend_parse() {
        assert_eq!("redis".parse::<CacheBackend>(), Ok(CacheBackend::Redis));
        assert_eq!(" Memory ".parse::<CacheBackend>(), Ok(CacheBackend::Memory));
        assert_eq!("off".parse::<CacheBackend>(), Ok(CacheBackend::None));
        assert!("memcached".parse::<CacheBackend>().is_err());
    }
}
