//! Property-Based Tests for the local LRU cache
//!
//! Checks `LocalCache` against a simple reference model of strict LRU.

use proptest::prelude::*;
use std::collections::VecDeque;
use tokio_test::block_on;

use crate::cache::{Cache, LocalCache, LruTracker};

// == Strategies ==
/// Small key space so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]".prop_map(|s| format!("league-options:{}", s))
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Vec<u8> },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

/// Reference model: front = most recently used.
#[derive(Default)]
struct Model {
    order: VecDeque<(String, Vec<u8>)>,
    capacity: usize,
}

impl Model {
    fn position(&self, key: &str) -> Option<usize> {
        self.order.iter().position(|(k, _)| k == key)
    }

    fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let idx = self.position(key)?;
        let entry = self.order.remove(idx)?;
        let value = entry.1.clone();
        self.order.push_front(entry);
        Some(value)
    }

    fn set(&mut self, key: String, value: Vec<u8>) {
        if let Some(idx) = self.position(&key) {
            self.order.remove(idx);
        } else if self.order.len() >= self.capacity {
            self.order.pop_back();
        }
        self.order.push_front((key, value));
    }

    fn delete(&mut self, key: &str) {
        if let Some(idx) = self.position(key) {
            self.order.remove(idx);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, every lookup answers exactly what a
    // strict LRU of the same capacity would answer.
    #[test]
    fn prop_matches_reference_lru(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let cache = LocalCache::new(capacity);
        let mut model = Model { capacity, ..Model::default() };

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    block_on(cache.set(&key, &value, None)).unwrap();
                    model.set(key, value);
                }
                CacheOp::Get { key } => {
                    let got = block_on(cache.get(&key)).unwrap();
                    prop_assert_eq!(got, model.get(&key), "lookup of {} diverged", key);
                }
                CacheOp::Delete { key } => {
                    block_on(cache.delete(&key)).unwrap();
                    model.delete(&key);
                }
            }
            prop_assert!(block_on(cache.len()) <= capacity);
            prop_assert_eq!(block_on(cache.len()), model.order.len());
        }
    }

    // Set then get returns the stored value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let cache = LocalCache::new(8);
        block_on(cache.set(&key, &value, None)).unwrap();
        prop_assert_eq!(block_on(cache.get(&key)).unwrap(), Some(value));
    }

    // Fill to capacity in any order, re-touch all but one key, insert a new
    // key: the untouched key is the one evicted.
    #[test]
    fn prop_untouched_key_is_evicted(
        keys in prop::collection::hash_set("[a-z]{1,8}", 2..10),
        victim_pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let capacity = keys.len();
        let victim = keys[victim_pick.index(capacity)].clone();
        let cache = LocalCache::new(capacity);

        for key in &keys {
            block_on(cache.set(key, key.as_bytes(), None)).unwrap();
        }
        for key in keys.iter().filter(|k| **k != victim) {
            prop_assert!(block_on(cache.get(key)).unwrap().is_some());
        }
        block_on(cache.set("fresh-key-0", b"new", None)).unwrap();

        prop_assert_eq!(block_on(cache.get(&victim)).unwrap(), None);
        for key in keys.iter().filter(|k| **k != victim) {
            prop_assert!(block_on(cache.get(key)).unwrap().is_some(), "{} should survive", key);
        }
    }

    // The tracker alone: eviction order is reverse touch order after dedup.
    #[test]
    fn prop_tracker_evicts_in_recency_order(touches in prop::collection::vec("[a-f]", 1..40)) {
        let mut tracker = LruTracker::new();
        let mut expected: Vec<String> = Vec::new();
        for key in &touches {
            tracker.touch(key);
            expected.retain(|k| k != key);
            expected.push(key.clone());
        }

        let mut evicted = Vec::new();
        while let Some(key) = tracker.evict_oldest() {
            evicted.push(key);
        }
        prop_assert_eq!(evicted, expected);
    }
}
