use crate::KeyValueCache;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A thread-safe cache guarded by a single reader/writer lock.
///
/// Every operation locks the whole mapping: lookups share the read lock,
/// mutations take the write lock. This is the degenerate one-shard form of
/// [`ShardMap`](crate::ShardMap). It gives up partition-level concurrency in
/// exchange for a stronger guarantee: [`keys`](Cache::keys) reads the entire
/// mapping under one read lock and therefore returns an atomic snapshot.
///
/// Cloning a `Cache` returns another handle to the same underlying mapping.
///
/// # Examples
///
/// ```
/// # use shard_cache::Cache;
/// let cache = Cache::new();
/// cache.set("key", "value".to_string());
///
/// assert_eq!(cache.get("key"), Some("value".to_string()));
/// assert_eq!(cache.get("missing"), None);
/// ```
pub struct Cache<V> {
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").field("len", &self.len()).finish()
    }
}

impl<V> Cache<V> {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of cached values.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` when no values are currently cached.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns `true` if there is a value in the cache mapped to by `key`.
    ///
    /// A key holding any value, including `None` or `0`, counts as present.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Gets a clone of the value in the cache mapped to by `key`.
    ///
    /// If no value exists for `key`, this returns `None`.
    ///
    /// Note: this returns a clone rather than a reference, since the lock
    /// guard is released before returning.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.inner.read().get(key).cloned()
    }

    /// Maps `key` to `value`, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.inner.write().insert(key.into(), value);
    }

    /// Removes the entry mapped to by `key`, returning its value.
    ///
    /// Returns `None` if `key` did not map to any value.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.inner.write().remove(key)
    }

    /// Removes the entry mapped to by `key`. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        self.remove(key);
    }

    /// Returns every key in the cache, in no particular order.
    ///
    /// The whole mapping is read under one read lock, so the result is a
    /// consistent snapshot: no concurrent write is partially reflected.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Returns a snapshot of every entry in the cache.
    pub fn entries(&self) -> Vec<(String, V)>
    where
        V: Clone,
    {
        self.inner
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Removes all entries from the cache.
    pub fn clear(&self) {
        let mut guard = self.inner.write();
        tracing::trace!(removed = guard.len(), "clearing cache");
        guard.clear();
    }

    /// Gets exclusive access to the underlying mapping.
    ///
    /// This can be useful for performing multiple operations atomically.
    pub fn with_lock<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut HashMap<String, V>) -> T,
    {
        let mut guard = self.inner.write();
        f(&mut guard)
    }
}

impl<V> KeyValueCache<V> for Cache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        Cache::get(self, key)
    }

    fn set(&self, key: String, value: V) {
        Cache::set(self, key, value)
    }

    fn delete(&self, key: &str) {
        Cache::delete(self, key)
    }

    fn contains(&self, key: &str) -> bool {
        Cache::contains(self, key)
    }

    fn keys(&self) -> Vec<String> {
        Cache::keys(self)
    }
}
