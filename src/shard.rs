use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// One independently-locked partition of a [`ShardMap`](crate::ShardMap).
///
/// A shard holds its own `String -> V` mapping behind a reader/writer lock:
/// lookups take the read lock and may run concurrently, mutations take the
/// write lock and exclude every other access to this shard.
///
/// Presence is explicit. A key that was set is reported as present no matter
/// what value it holds, including values like `None` or `0`.
///
/// Shards handed out by [`ShardMap::shard`](crate::ShardMap::shard) are
/// read-only: entries only reach a shard through the map's routing, so every
/// key lives in exactly the shard its route points to.
pub struct Shard<V> {
    data: RwLock<HashMap<String, V>>,
}

impl<V> fmt::Debug for Shard<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard").field("len", &self.len()).finish()
    }
}

impl<V> Shard<V> {
    pub(crate) fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a clone of the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.data.read().get(key).cloned()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub(crate) fn set(&self, key: String, value: V) {
        self.data.write().insert(key, value);
    }

    /// Removes `key` and returns its previous value.
    pub(crate) fn remove(&self, key: &str) -> Option<V> {
        self.data.write().remove(key)
    }

    /// Removes `key`. Removing an absent key does nothing.
    pub(crate) fn delete(&self, key: &str) {
        self.remove(key);
    }

    /// Returns `true` if `key` is present in this shard.
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Returns the keys of this shard, read under a single read lock.
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Returns every entry of this shard, cloned under a single read lock.
    pub fn entries(&self) -> Vec<(String, V)>
    where
        V: Clone,
    {
        self.data
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns the number of entries in this shard.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns `true` when this shard holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Removes every entry from this shard.
    pub(crate) fn clear(&self) {
        self.data.write().clear();
    }
}
