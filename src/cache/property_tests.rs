//! Property-Based Tests for the Cache Module
//!
//! Uses proptest to verify the cache's behavioral properties over random
//! operation sequences. Time is driven by a manual clock, so nothing here
//! sleeps.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cache::{CacheManager, Priority};
use crate::clock::{Clock, ManualClock};
use crate::config::CacheConfig;
use crate::persist::{MemoryStore, PersistRequest, PersistenceHandle};

// == Test Configuration ==
const START: u64 = 1_700_000_000_000;

fn fresh_cache(
    config: CacheConfig,
) -> (CacheManager, Arc<ManualClock>, UnboundedReceiver<PersistRequest>) {
    let clock = Arc::new(ManualClock::new(START));
    let store = MemoryStore::new();
    let (handle, rx) = PersistenceHandle::channel();
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let cache = CacheManager::new(config, &store, shared_clock, handle);
    (cache, clock, rx)
}

// == Strategies ==
/// Generates valid cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,16}"
}

/// Generates payload strings
fn payload_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Normal),
        Just(Priority::High),
        Just(Priority::Critical),
    ]
}

/// A sequence of cache operations for model-based testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), payload_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of set/get/delete operations without TTLs, the hit and
    // miss counters match a model that only tracks key presence.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let (mut cache, clock, _rx) = fresh_cache(CacheConfig::default());
        let mut present: HashSet<String> = HashSet::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            clock.advance(1);
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), json!(value), None, Priority::Normal);
                    present.insert(key);
                }
                CacheOp::Get { key } => {
                    let result = cache.get(&key);
                    if present.contains(&key) {
                        prop_assert!(result.is_some(), "Expected hit for '{}'", key);
                        expected_hits += 1;
                    } else {
                        prop_assert!(result.is_none(), "Expected miss for '{}'", key);
                        expected_misses += 1;
                    }
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                    present.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, present.len(), "Total entries mismatch");
    }

    // For any valid key and payload, storing then retrieving (before any
    // expiry) returns the exact payload that was stored.
    #[test]
    fn prop_roundtrip_storage(
        key in key_strategy(),
        value in payload_strategy(),
        priority in priority_strategy()
    ) {
        let (mut cache, _clock, _rx) = fresh_cache(CacheConfig::default());

        cache.set(key.clone(), json!(value.clone()), None, priority);
        prop_assert_eq!(cache.get(&key), Some(json!(value)));
    }

    // For any key, storing V1 then V2 under it leaves exactly one entry whose
    // payload is V2 and whose size reflects V2 alone.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in payload_strategy(),
        value2 in payload_strategy()
    ) {
        let (mut cache, _clock, _rx) = fresh_cache(CacheConfig::default());

        cache.set(key.clone(), json!(value1), None, Priority::Normal);
        cache.set(key.clone(), json!(value2.clone()), None, Priority::Normal);

        prop_assert_eq!(cache.get(&key), Some(json!(value2.clone())));
        prop_assert_eq!(cache.len(), 1, "Should have exactly one entry after overwrite");

        let stats = cache.stats();
        let expected_size = serde_json::to_vec(&json!(value2)).unwrap().len();
        prop_assert_eq!(stats.total_size, expected_size, "Size should reflect only the replacement");
    }

    // For any key present in the cache, after delete a get misses.
    #[test]
    fn prop_delete_removes_entry(
        key in key_strategy(),
        value in payload_strategy()
    ) {
        let (mut cache, _clock, _rx) = fresh_cache(CacheConfig::default());

        cache.set(key.clone(), json!(value), None, Priority::Normal);
        prop_assert!(cache.has(&key), "Key should exist before delete");

        prop_assert!(cache.delete(&key));
        prop_assert!(cache.get(&key).is_none(), "Key should not exist after delete");
    }

    // For any sequence of inserts with mixed priorities, the cache never
    // exceeds its configured entry or size bounds.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (key_strategy(), payload_strategy(), priority_strategy()),
            1..150
        )
    ) {
        let max_entries = 25;
        let max_size = 1_500;
        let (mut cache, clock, _rx) = fresh_cache(CacheConfig {
            max_entries,
            max_size,
            ..Default::default()
        });

        for (key, value, priority) in entries {
            cache.set(key, json!(value), None, priority);
            clock.advance(1);

            let stats = cache.stats();
            prop_assert!(
                stats.total_entries <= max_entries,
                "Entry count {} exceeds max {}",
                stats.total_entries,
                max_entries
            );
            prop_assert!(
                stats.total_size <= max_size,
                "Total size {} exceeds max {}",
                stats.total_size,
                max_size
            );
        }
    }

    // Filling the cache with low-priority entries and one critical entry,
    // then forcing one eviction, never removes the critical entry.
    #[test]
    fn prop_critical_survives_while_lower_tiers_remain(
        low_keys in prop::collection::hash_set("[a-z]{1,8}", 2..8),
        value in payload_strategy()
    ) {
        let low_keys: Vec<String> = low_keys.into_iter().collect();
        let capacity = low_keys.len() + 1;
        let (mut cache, clock, _rx) = fresh_cache(CacheConfig {
            max_entries: capacity,
            ..Default::default()
        });

        // Uppercase keys cannot collide with the generated lowercase ones
        cache.set("VITAL", json!(value.clone()), None, Priority::Critical);
        for key in &low_keys {
            clock.advance(1);
            cache.set(key.clone(), json!(value.clone()), None, Priority::Low);
        }
        prop_assert_eq!(cache.len(), capacity);

        clock.advance(1);
        cache.set("ONE_MORE", json!(value), None, Priority::Normal);

        prop_assert!(cache.has("VITAL"), "Critical entry must outlive low-priority ones");
        prop_assert_eq!(cache.stats().evictions, 1);
    }

    // The oldest untouched entry within a tier is the eviction victim.
    #[test]
    fn prop_lru_tie_break(
        keys in prop::collection::hash_set("[a-z]{1,8}", 3..8),
        value in payload_strategy()
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let capacity = keys.len();
        let (mut cache, clock, _rx) = fresh_cache(CacheConfig {
            max_entries: capacity,
            ..Default::default()
        });

        for key in &keys {
            cache.set(key.clone(), json!(value.clone()), None, Priority::Normal);
            clock.advance(1);
        }

        // Refresh the first-inserted entry; the second becomes the victim
        cache.get(&keys[0]);
        clock.advance(1);

        // Uppercase key cannot collide with the generated lowercase ones
        cache.set("NEWCOMER", json!(value), None, Priority::Normal);

        prop_assert!(cache.has(&keys[0]), "Recently read entry must survive");
        prop_assert!(!cache.has(&keys[1]), "Least recently used entry must be evicted");
        for key in keys.iter().skip(2) {
            prop_assert!(cache.has(key), "Entry '{}' should be untouched", key);
        }
    }
}
