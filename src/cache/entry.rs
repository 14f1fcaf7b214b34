//! Shared-cache entries.
//!
//! The in-process shared cache always writes with a TTL, so an entry is just
//! the payload and the wall-clock millisecond at which it stops being served.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    /// Unix milliseconds; the entry is dead from this instant on.
    pub expires_at_ms: u64,
}

impl CacheEntry {
    pub fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            value,
            expires_at_ms: now_ms().saturating_add(ttl_ms),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }

    /// Expiry is inclusive: an entry read exactly at `expires_at_ms` is gone.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Time left before expiry, saturating at zero.
    pub fn remaining_at(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at_ms.saturating_sub(now_ms))
    }
}

/// Wall clock in Unix milliseconds. A clock set before 1970 reads as 0.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar_body() -> Vec<u8> {
        b"BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".to_vec()
    }

    #[test]
    fn test_fresh_calendar_entry_is_served() {
        let before = now_ms();
        let entry = CacheEntry::new(calendar_body(), Duration::from_secs(30 * 60));

        assert!(!entry.is_expired());
        assert!(entry.expires_at_ms >= before + 30 * 60 * 1000);
        assert!(entry.remaining_at(before) >= Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let entry = CacheEntry {
            value: calendar_body(),
            expires_at_ms: 5_000,
        };

        assert!(!entry.is_expired_at(4_999));
        assert!(entry.is_expired_at(5_000));
        assert_eq!(entry.remaining_at(4_000), Duration::from_secs(1));
        assert_eq!(entry.remaining_at(9_000), Duration::ZERO);
    }

    #[test]
    fn test_zero_ttl_is_dead_on_arrival() {
        let entry = CacheEntry::new(b"[]".to_vec(), Duration::ZERO);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_does_not_wrap() {
        let entry = CacheEntry::new(Vec::new(), Duration::MAX);
        assert_eq!(entry.expires_at_ms, u64::MAX);
        assert!(!entry.is_expired());
    }
}
