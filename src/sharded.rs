use crate::error::{CacheError, Result};
use crate::{KeyValueCache, Router, Shard, ROUTABLE_SHARDS};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of shards to use if not specified explicitly.
pub const DEFAULT_SHARDS: usize = 16;

const DEFAULT_SHARD_COUNT: NonZeroUsize = NonZeroUsize::MIN.saturating_add(DEFAULT_SHARDS - 1);

/// A thread-safe cache that splits its keys across independently-locked shards.
///
/// Each key is routed to exactly one [`Shard`] by a [`Router`]. Single-key
/// operations lock only that shard, so operations on keys living in different
/// shards proceed in parallel.
///
/// # Thread Safety Characteristics
///
/// - Operations on the same key always map to the same shard and are serialized
///   by that shard's reader/writer lock
/// - Operations on keys in different shards are fully independent
/// - No operation holds more than one shard lock at a time, so no lock cycle
///   can form
///
/// ## Consistency Model
///
/// - **Per-Key Consistency**: each single-key operation is atomic
/// - **Cross-Shard Consistency**: none; a sequence of `set` calls on different
///   keys is not transactional
/// - **Key Enumeration**: [`keys`](ShardMap::keys) snapshots every shard under
///   that shard's read lock, but shards are read at different instants. Use
///   [`Cache`](crate::Cache) when an atomic enumeration of the whole cache is
///   required.
///
/// Cloning a `ShardMap` returns another handle to the same shards.
///
/// # Examples
///
/// ```
/// # use shard_cache::ShardMap;
/// # use std::collections::HashSet;
/// let cache = ShardMap::with_shards(3).unwrap();
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3);
///
/// let keys: HashSet<_> = cache.keys().into_iter().collect();
/// assert_eq!(keys.len(), 3);
/// assert!(keys.contains("a") && keys.contains("b") && keys.contains("c"));
/// ```
///
/// ## Multi-Threaded Example
///
/// ```
/// # use shard_cache::ShardMap;
/// # use std::sync::Arc;
/// # use std::thread;
/// let cache = Arc::new(ShardMap::with_shards(8).unwrap());
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let cache = Arc::clone(&cache);
///         thread::spawn(move || {
///             for i in 0..100 {
///                 cache.set(format!("thread{}key{}", t, i), i);
///             }
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(cache.len(), 400);
/// ```
pub struct ShardMap<V> {
    shards: Arc<[Shard<V>]>,
    router: Router,
    /// Upper bound on the parallel tasks used by `keys()`.
    key_workers: usize,
}

impl<V> Clone for ShardMap<V> {
    fn clone(&self) -> Self {
        Self {
            shards: Arc::clone(&self.shards),
            router: self.router,
            key_workers: self.key_workers,
        }
    }
}

impl<V> Default for ShardMap<V> {
    /// Creates an empty map with [`DEFAULT_SHARDS`] shards.
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ShardMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardMap")
            .field("len", &self.len())
            .field("num_shards", &self.num_shards())
            .field("key_workers", &self.key_workers)
            .finish()
    }
}

impl<V> IntoIterator for ShardMap<V>
where
    V: Clone,
{
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    /// Converts the map into an iterator over a snapshot of its entries.
    fn into_iter(self) -> Self::IntoIter {
        self.entries().into_iter()
    }
}

#[cfg(feature = "sync")]
impl<V> From<crate::Cache<V>> for ShardMap<V>
where
    V: Clone,
{
    /// Re-partitions the entries of a single-lock cache over [`DEFAULT_SHARDS`] shards.
    ///
    /// # Examples
    ///
    /// ```
    /// # use shard_cache::{Cache, ShardMap};
    /// let cache = Cache::new();
    /// cache.set("key", "value".to_string());
    ///
    /// let sharded = ShardMap::from(cache);
    /// assert_eq!(sharded.get("key"), Some("value".to_string()));
    /// ```
    fn from(cache: crate::Cache<V>) -> Self {
        let sharded = Self::new();
        for (key, value) in cache.entries() {
            sharded.set(key, value);
        }
        sharded
    }
}

impl<V> ShardMap<V> {
    /// Creates an empty map with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::from_router(Router::with_count(DEFAULT_SHARD_COUNT))
    }

    /// Creates an empty map with `num_shards` shards.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidShardCount`] if `num_shards` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use shard_cache::{CacheError, ShardMap};
    /// let cache: ShardMap<u32> = ShardMap::with_shards(8).unwrap();
    /// assert_eq!(cache.num_shards(), 8);
    ///
    /// assert_eq!(
    ///     ShardMap::<u32>::with_shards(0).unwrap_err(),
    ///     CacheError::InvalidShardCount { requested: 0 }
    /// );
    /// ```
    pub fn with_shards(num_shards: usize) -> Result<Self> {
        Ok(Self::from_router(Router::new(num_shards)?))
    }

    fn from_router(router: Router) -> Self {
        let num_shards = router.shard_count();
        let shards: Vec<Shard<V>> = (0..num_shards).map(|_| Shard::new()).collect();
        let key_workers = rayon::current_num_threads();
        tracing::debug!(num_shards, key_workers, "created shard map");
        Self {
            shards: shards.into(),
            router,
            key_workers,
        }
    }

    /// Bounds the number of parallel tasks [`keys`](ShardMap::keys) fans out to.
    ///
    /// By default `keys()` splits the shards into as many groups as the rayon
    /// thread pool has threads. Each task enumerates one contiguous group of
    /// shards. With a single worker, enumeration runs on the calling thread.
    /// The per-shard snapshot semantics are the same either way.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidWorkerCount`] if `workers` is zero.
    pub fn with_key_workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(CacheError::InvalidWorkerCount { requested: workers });
        }
        self.key_workers = workers;
        tracing::debug!(workers, "bounded key enumeration workers");
        Ok(self)
    }

    /// Returns the number of shards in this map.
    #[inline]
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Returns the index of the shard that owns `key`.
    #[inline]
    pub fn shard_index(&self, key: &str) -> usize {
        self.router.route(key)
    }

    /// Gets a specific shard by index, or `None` if the index is out of bounds.
    ///
    /// This is mainly useful for inspecting how keys are partitioned. The
    /// returned shard only offers read access; writes always go through the
    /// map so that keys stay in their routed shard.
    ///
    /// ```compile_fail
    /// # use shard_cache::ShardMap;
    /// let cache: ShardMap<u32> = ShardMap::with_shards(4).unwrap();
    /// cache.shard(0).unwrap().set("key".to_string(), 1);
    /// ```
    pub fn shard(&self, index: usize) -> Option<&Shard<V>> {
        self.shards.get(index)
    }

    #[inline]
    fn shard_for(&self, key: &str) -> &Shard<V> {
        &self.shards[self.router.route(key)]
    }

    /// Returns the total number of entries across all shards.
    ///
    /// Each shard is read under its own lock in turn, so the total is not an
    /// atomic count under concurrent writes.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns `true` when no shard holds any entry.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Returns `true` if there is a value mapped to by `key`.
    ///
    /// This only takes the read lock of the shard owning `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.shard_for(key).contains(key)
    }

    /// Gets a clone of the value mapped to by `key`.
    ///
    /// Returns `None` if the key is absent. This only takes the read lock of
    /// the shard owning `key`.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.shard_for(key).get(key)
    }

    /// Maps `key` to `value`, replacing any previous value.
    ///
    /// This only takes the write lock of the shard owning `key`.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.shard_for(&key).set(key, value);
    }

    /// Removes the entry mapped to by `key`, returning its value.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.shard_for(key).remove(key)
    }

    /// Removes the entry mapped to by `key`. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        self.shard_for(key).delete(key);
    }

    /// Removes all entries from every shard, one shard at a time.
    pub fn clear(&self) {
        tracing::trace!(num_shards = self.num_shards(), "clearing shard map");
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    /// Returns a snapshot of every entry, read shard by shard.
    pub fn entries(&self) -> Vec<(String, V)>
    where
        V: Clone,
    {
        self.shards.iter().flat_map(Shard::entries).collect()
    }

    /// Returns every key in the map, in no particular order.
    ///
    /// Shards are enumerated concurrently on the rayon thread pool: each task
    /// takes a shard's read lock, copies its keys into a local batch, releases
    /// the shard lock, and appends the batch to a shared accumulator guarded by
    /// its own mutex. The call returns once every task has finished. Shards
    /// past [`ROUTABLE_SHARDS`] never hold keys and are skipped.
    ///
    /// Every key present in a shard when that shard was read is returned.
    /// Shards are read at different instants, so keys written or removed
    /// concurrently with this call may or may not appear.
    pub fn keys(&self) -> Vec<String>
    where
        V: Send + Sync,
    {
        let routable = &self.shards[..self.num_shards().min(ROUTABLE_SHARDS)];
        let workers = self.key_workers.min(routable.len());
        if workers <= 1 {
            return routable.iter().flat_map(Shard::keys).collect();
        }

        let group_size = (routable.len() + workers - 1) / workers;
        let collected = Mutex::new(Vec::new());

        routable.par_chunks(group_size).for_each(|group| {
            for shard in group {
                let batch = shard.keys();
                collected.lock().extend(batch);
            }
        });

        let keys = collected.into_inner();
        tracing::trace!(workers, keys = keys.len(), "collected keys from shards");
        keys
    }
}

impl<V> KeyValueCache<V> for ShardMap<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        ShardMap::get(self, key)
    }

    fn set(&self, key: String, value: V) {
        ShardMap::set(self, key, value)
    }

    fn delete(&self, key: &str) {
        ShardMap::delete(self, key)
    }

    fn contains(&self, key: &str) -> bool {
        ShardMap::contains(self, key)
    }

    fn keys(&self) -> Vec<String> {
        ShardMap::keys(self)
    }
}
