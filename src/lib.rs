#![doc = include_str!("../README.md")]

mod error;
mod router;
mod shard;

#[cfg(feature = "sharded")]
mod sharded;
#[cfg(feature = "sync")]
mod sync;

pub use error::{CacheError, Result};
pub use router::{Router, ROUTABLE_SHARDS};
pub use shard::Shard;

#[cfg(feature = "sharded")]
pub use sharded::{ShardMap, DEFAULT_SHARDS};
#[cfg(feature = "sync")]
pub use sync::Cache;

/// The operations shared by every cache flavour in this crate.
///
/// Both [`Cache`] and [`ShardMap`] implement this trait, so code that only
/// needs get/set/delete/contains/keys can accept either one, including as a
/// trait object.
///
/// # Examples
///
/// ```
/// # use shard_cache::{Cache, KeyValueCache, ShardMap};
/// # use std::sync::Arc;
/// fn warm(cache: &dyn KeyValueCache<u32>) {
///     cache.set("warm".to_string(), 1);
/// }
///
/// let single: Arc<dyn KeyValueCache<u32>> = Arc::new(Cache::new());
/// let sharded: Arc<dyn KeyValueCache<u32>> = Arc::new(ShardMap::with_shards(4).unwrap());
/// for cache in [single, sharded] {
///     warm(cache.as_ref());
///     assert_eq!(cache.get("warm"), Some(1));
/// }
/// ```
pub trait KeyValueCache<V>: Send + Sync {
    /// Returns a clone of the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Option<V>;

    /// Stores `value` under `key`, overwriting any previous value.
    fn set(&self, key: String, value: V);

    /// Removes `key`; removing an absent key is a no-op.
    fn delete(&self, key: &str);

    /// Returns `true` if `key` is present.
    fn contains(&self, key: &str) -> bool;

    /// Returns every key currently present, in no particular order.
    fn keys(&self) -> Vec<String>;
}
