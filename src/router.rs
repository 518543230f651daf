use crate::error::{CacheError, Result};
use sha1::{Digest, Sha1};
use std::num::NonZeroUsize;

/// Number of distinct values the router reduces before taking the modulus.
///
/// Only the first byte of the digest participates in routing, so shard
/// indices at or above this value are never produced.
pub const ROUTABLE_SHARDS: usize = 256;

/// Maps string keys to shard indices.
///
/// The index of a key is the first byte of its SHA-1 digest, reduced modulo
/// the shard count. The mapping is a pure function of the key and the shard
/// count, so a key always lands on the same shard for the lifetime of a map.
///
/// # Distribution
///
/// Reducing a single byte means there are only 256 pre-modulo values. When the
/// shard count does not divide 256, the lower-index shards receive a slightly
/// larger share of keys (for 3 shards: 86/256 for shard 0, 85/256 for the
/// others). With more than 256 shards, the shards past index 255 stay empty.
///
/// # Examples
///
/// ```
/// # use shard_cache::Router;
/// let router = Router::new(8).unwrap();
/// let index = router.route("user:42");
/// assert!(index < 8);
/// assert_eq!(router.route("user:42"), index);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Router {
    shard_count: usize,
}

impl Router {
    /// Creates a router over `shard_count` shards.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidShardCount`] if `shard_count` is zero.
    pub fn new(shard_count: usize) -> Result<Self> {
        NonZeroUsize::new(shard_count)
            .map(Self::with_count)
            .ok_or(CacheError::InvalidShardCount {
                requested: shard_count,
            })
    }

    /// Creates a router over a shard count that is known to be non-zero.
    pub(crate) fn with_count(shard_count: NonZeroUsize) -> Self {
        let shard_count = shard_count.get();
        if shard_count > ROUTABLE_SHARDS {
            tracing::warn!(
                shard_count,
                unreachable = shard_count - ROUTABLE_SHARDS,
                "shard count exceeds routable range; upper shards will stay empty"
            );
        }
        Self { shard_count }
    }

    /// Returns the number of shards this router distributes keys over.
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Returns the shard index in `[0, shard_count)` for `key`.
    #[inline]
    pub fn route(&self, key: &str) -> usize {
        let digest = Sha1::digest(key.as_bytes());
        usize::from(digest[0]) % self.shard_count
    }
}
