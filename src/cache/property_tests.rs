//! Property-based tests for the response cache.

use proptest::prelude::*;

use crate::cache::store::ResponseCache;
use crate::config::CacheConfig;

const MAX_OBJECT: usize = 64;
const MAX_TOTAL: usize = 256;

fn test_cache() -> ResponseCache {
    ResponseCache::new(&CacheConfig {
        max_object_bytes: MAX_OBJECT,
        max_cache_bytes: MAX_TOTAL,
    })
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,4}".prop_map(|s| format!("http://origin/{s}"))
}

#[derive(Debug, Clone)]
enum CacheOp {
    Insert { key: String, size: usize },
    Lookup { key: String },
}

fn op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), 0..(MAX_OBJECT * 2))
            .prop_map(|(key, size)| CacheOp::Insert { key, size }),
        key_strategy().prop_map(|key| CacheOp::Lookup { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // After any operation sequence: total == sum of entry sizes, total stays
    // under the aggregate cap, and no entry exceeds the object cap.
    #[test]
    fn capacity_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let cache = test_cache();
        for op in ops {
            match op {
                CacheOp::Insert { key, size } => {
                    let stored = cache.insert(&key, vec![b'p'; size]);
                    prop_assert_eq!(stored, size <= MAX_OBJECT);
                }
                CacheOp::Lookup { key } => {
                    let _ = cache.lookup(&key);
                }
            }

            let snapshot = cache.snapshot();
            let sum: usize = snapshot.entries.iter().map(|e| e.size).sum();
            prop_assert_eq!(snapshot.total_bytes, sum);
            prop_assert!(snapshot.total_bytes <= MAX_TOTAL);
            prop_assert!(snapshot.entries.iter().all(|e| e.size <= MAX_OBJECT));
        }
    }

    // Inserting then looking up returns exactly the stored bytes.
    #[test]
    fn insert_lookup_roundtrip(key in key_strategy(), size in 0..=MAX_OBJECT) {
        let cache = test_cache();
        let body = vec![b'r'; size];
        prop_assert!(cache.insert(&key, body.clone()));
        let hit = cache.lookup(&key).expect("fresh insert must be present");
        prop_assert_eq!(&*hit, body.as_slice());
    }

    // Re-inserting the same key never duplicates it.
    #[test]
    fn replacement_keeps_keys_unique(key in key_strategy(), sizes in prop::collection::vec(0..=MAX_OBJECT, 1..10)) {
        let cache = test_cache();
        for size in &sizes {
            cache.insert(&key, vec![b'q'; *size]);
        }
        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.total_bytes(), *sizes.last().unwrap());
    }
}
