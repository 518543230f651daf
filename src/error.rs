//! Error types for cache construction.

use thiserror::Error;

/// Errors reported when a cache is configured with invalid parameters.
///
/// Once a cache has been built, none of its operations fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A sharded cache was requested with no shards to route keys to.
    #[error("shard count must be greater than 0 (requested {requested})")]
    InvalidShardCount { requested: usize },

    /// Key enumeration was configured with no worker to run it.
    #[error("key enumeration needs at least one worker (requested {requested})")]
    InvalidWorkerCount { requested: usize },
}

/// Result alias used throughout the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;
