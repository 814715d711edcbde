use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a cache backend. They never leave the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A cached value could not be encoded or decoded.
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Minimal key-value contract the cache layer needs from its backend.
///
/// Values are opaque strings. Implementations must be safe to share across
/// tasks; the gateway holds one behind an `Arc`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a single key.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Read many keys in one round trip. The result is aligned with `keys`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError>;

    /// Write a key with a time-to-live.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove keys. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;

    /// List keys matching a glob pattern (`*` and `?`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Whether a key is present.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Atomically increment a counter, arming `window` as its expiry on the
    /// first increment. Returns the new count.
    async fn incr_with_expiry(&self, key: &str, window: Duration) -> Result<u64, CacheError>;

    /// Round-trip health probe.
    async fn ping(&self) -> Result<(), CacheError>;
}
