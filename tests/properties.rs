//! Property tests for routing and the shared cache contract.

use proptest::prelude::*;
use shard_cache::{Cache, KeyValueCache, Router, ShardMap};
use std::collections::{BTreeSet, HashMap};

fn caches() -> Vec<Box<dyn KeyValueCache<i64>>> {
    let mut caches: Vec<Box<dyn KeyValueCache<i64>>> = Vec::new();
    caches.push(Box::new(Cache::<i64>::new()));
    for shard_count in [1, 3, 16] {
        caches.push(Box::new(ShardMap::<i64>::with_shards(shard_count).unwrap()));
    }
    caches
}

#[derive(Debug, Clone)]
enum Op {
    Set(String, i64),
    Delete(String),
}

fn op() -> impl Strategy<Value = Op> {
    let key = "[a-e]{1,3}";
    prop_oneof![
        (key, any::<i64>()).prop_map(|(k, v)| Op::Set(k, v)),
        key.prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn set_then_get_returns_value(key in ".*", value in any::<i64>()) {
        for cache in caches() {
            cache.set(key.clone(), value);
            prop_assert_eq!(cache.get(&key), Some(value));
            prop_assert!(cache.contains(&key));
        }
    }

    #[test]
    fn delete_removes_and_is_idempotent(key in ".*", value in any::<i64>(), populate in any::<bool>()) {
        for cache in caches() {
            if populate {
                cache.set(key.clone(), value);
            }
            cache.delete(&key);
            prop_assert!(!cache.contains(&key));
            prop_assert!(cache.keys().is_empty());

            cache.delete(&key);
            prop_assert!(!cache.contains(&key));
            prop_assert!(cache.keys().is_empty());
        }
    }

    #[test]
    fn routing_is_stable_and_in_range(key in ".*", shard_count in 1usize..512) {
        let router = Router::new(shard_count).unwrap();
        let index = router.route(&key);
        prop_assert!(index < shard_count);
        prop_assert_eq!(router.route(&key), index);
        prop_assert_eq!(Router::new(shard_count).unwrap().route(&key), index);
    }

    #[test]
    fn concurrent_keys_match_per_shard_union(
        keys in prop::collection::hash_set("[a-z0-9]{1,8}", 0..200),
        shard_count in 1usize..32,
    ) {
        let cache = ShardMap::with_shards(shard_count).unwrap();
        for key in &keys {
            cache.set(key.clone(), ());
        }

        let mut direct = BTreeSet::new();
        for index in 0..cache.num_shards() {
            direct.extend(cache.shard(index).unwrap().keys());
        }

        let concurrent = cache.keys();
        prop_assert_eq!(concurrent.len(), keys.len());
        let concurrent: BTreeSet<_> = concurrent.into_iter().collect();
        prop_assert_eq!(&concurrent, &direct);
        prop_assert_eq!(concurrent, keys.into_iter().collect::<BTreeSet<_>>());
    }

    #[test]
    fn caches_agree_with_hashmap_model(ops in prop::collection::vec(op(), 0..100)) {
        let mut model = HashMap::new();
        let caches = caches();

        for op in &ops {
            match op {
                Op::Set(key, value) => {
                    model.insert(key.clone(), *value);
                    for cache in &caches {
                        cache.set(key.clone(), *value);
                    }
                }
                Op::Delete(key) => {
                    model.remove(key);
                    for cache in &caches {
                        cache.delete(key);
                    }
                }
            }
        }

        let expected: BTreeSet<_> = model.keys().cloned().collect();
        for cache in &caches {
            let keys: BTreeSet<_> = cache.keys().into_iter().collect();
            prop_assert_eq!(&keys, &expected);
            for (key, value) in &model {
                prop_assert_eq!(cache.get(key), Some(*value));
            }
        }
    }
}
