//! Typed, fail-soft cache used by the gateway.
//!
//! Every failure of the backing store (connection, command, encoding) is
//! logged and turned into a miss, a no-op or `false`. Callers never see a
//! cache error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::keys::{CacheKeys, CacheTtl};
use super::memory::MemoryStore;
use super::store::KeyValueStore;

/// JSON cache over a [`KeyValueStore`].
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn KeyValueStore>,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cache backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cache decode error for '{}': {}", key, e);
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => Self::decode(key, &raw),
            Ok(None) => None,
            Err(e) => {
                warn!("Cache get error for '{}': {}", key, e);
                None
            }
        }
    }

    /// Batched read. The result always has one slot per key.
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[String]) -> Vec<Option<T>> {
        if keys.is_empty() {
            return Vec::new();
        }
        match self.store.mget(keys).await {
            Ok(values) if values.len() == keys.len() => keys
                .iter()
                .zip(values)
                .map(|(key, raw)| raw.and_then(|raw| Self::decode(key, &raw)))
                .collect(),
            Ok(values) => {
                warn!(
                    "Cache mget returned {} values for {} keys",
                    values.len(),
                    keys.len()
                );
                keys.iter().map(|_| None).collect()
            }
            Err(e) => {
                warn!("Cache mget error: {}", e);
                keys.iter().map(|_| None).collect()
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: CacheTtl) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache encode error for '{}': {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(key, raw, ttl.duration()).await {
            warn!("Cache set error for '{}': {}", key, e);
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.store.delete(&[key.to_string()]).await {
            warn!("Cache delete error for '{}': {}", key, e);
        }
    }

    /// Delete every key matching a glob pattern.
    pub async fn delete_pattern(&self, pattern: &str) {
        let keys = match self.store.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Cache keys error for '{}': {}", pattern, e);
                return;
            }
        };
        if keys.is_empty() {
            return;
        }
        debug!("Deleting {} cache keys matching '{}'", keys.len(), pattern);
        if let Err(e) = self.store.delete(&keys).await {
            warn!("Cache delete error for '{}': {}", pattern, e);
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Cache exists error for '{}': {}", key, e);
                false
            }
        }
    }

    /// Return the cached value, or run `fetch` and cache a present result.
    ///
    /// An absent fetch result is not cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: CacheTtl, fetch: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Some(cached);
        }
        let value = fetch().await?;
        self.set(key, &value, ttl).await;
        Some(value)
    }

    pub async fn is_healthy(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache health check failed: {}", e);
                false
            }
        }
    }

    /// Fixed-window counter for inbound request limiting.
    ///
    /// Returns true once `identifier` exceeds `max` hits of `action` within
    /// `window`. Fails open: a store error never limits.
    pub async fn is_rate_limited(
        &self,
        identifier: &str,
        action: &str,
        max: u64,
        window: Duration,
    ) -> bool {
        let key = CacheKeys::rate_limit(action, identifier);
        match self.store.incr_with_expiry(&key, window).await {
            Ok(count) => count > max,
            Err(e) => {
                warn!("Rate limit check failed for '{}': {}", key, e);
                false
            }
        }
    }

    /// Drop the cached quote and profile for a symbol.
    pub async fn invalidate_symbol(&self, symbol: &str) {
        let keys = vec![CacheKeys::quote(symbol), CacheKeys::profile(symbol)];
        if let Err(e) = self.store.delete(&keys).await {
            warn!("Cache invalidation error for '{}': {}", symbol, e);
        }
    }

    /// Drop the market-wide composite views.
    pub async fn invalidate_market(&self) {
        let keys = vec![CacheKeys::market_indices(), CacheKeys::heatmap()];
        if let Err(e) = self.store.delete(&keys).await {
            warn!("Cache invalidation error for market views: {}", e);
        }
        self.delete_pattern(&CacheKeys::top_movers_pattern()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose every command fails, as an unreachable Redis would.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
        async fn mget(&self, _keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
        async fn delete(&self, _keys: &[String]) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
        async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
        async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
        async fn incr_with_expiry(&self, _key: &str, _window: Duration) -> Result<u64, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
        async fn ping(&self) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips_json() {
        let cache = CacheLayer::in_memory();
        cache.set("k", &vec![1, 2, 3], CacheTtl::Hot).await;

        let value: Option<Vec<i32>> = cache.get("k").await;
        assert_eq!(value, Some(vec![1, 2, 3]));
        assert!(cache.exists("k").await);
    }

    #[tokio::test]
    async fn test_undecodable_value_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("k", "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = CacheLayer::new(store);

        let value: Option<Vec<i32>> = cache.get("k").await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_broken_store_degrades_to_misses() {
        let cache = CacheLayer::new(Arc::new(BrokenStore));

        cache.set("k", &1, CacheTtl::Hot).await;
        assert_eq!(cache.get::<i32>("k").await, None);
        assert_eq!(
            cache.get_many::<i32>(&["a".to_string(), "b".to_string()]).await,
            vec![None, None]
        );
        assert!(!cache.exists("k").await);
        assert!(!cache.is_healthy().await);
        cache.delete_pattern("market:*").await;
    }

    #[tokio::test]
    async fn test_rate_limit_fails_open_on_broken_store() {
        let cache = CacheLayer::new(Arc::new(BrokenStore));
        assert!(
            !cache
                .is_rate_limited("1.2.3.4", "api", 1, Duration::from_secs(60))
                .await
        );
    }

    #[tokio::test]
    async fn test_rate_limit_trips_after_max() {
        let cache = CacheLayer::in_memory();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            assert!(!cache.is_rate_limited("client", "api", 3, window).await);
        }
        assert!(cache.is_rate_limited("client", "api", 3, window).await);
        assert!(!cache.is_rate_limited("other", "api", 3, window).await);
    }

    #[tokio::test]
    async fn test_get_or_fetch_only_fetches_on_miss() {
        let cache = CacheLayer::in_memory();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_fetch("profile", CacheTtl::Cold, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some("Petrobras".to_string())
                })
                .await;
            assert_eq!(value.as_deref(), Some("Petrobras"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_does_not_cache_absent() {
        let cache = CacheLayer::in_memory();
        let value: Option<String> = cache
            .get_or_fetch("missing", CacheTtl::Cold, || async { None })
            .await;
        assert!(value.is_none());
        assert!(!cache.exists("missing").await);
    }

    #[tokio::test]
    async fn test_invalidate_market_clears_movers_and_indices() {
        let cache = CacheLayer::in_memory();
        cache.set(&CacheKeys::market_indices(), &1, CacheTtl::Warm).await;
        cache.set(&CacheKeys::top_movers("1d"), &1, CacheTtl::Warm).await;
        cache.set(&CacheKeys::top_movers("1w"), &1, CacheTtl::Warm).await;
        cache.set(&CacheKeys::heatmap(), &1, CacheTtl::Warm).await;
        cache.set(&CacheKeys::quote("AAPL"), &1, CacheTtl::Static).await;

        cache.invalidate_market().await;

        assert!(!cache.exists(&CacheKeys::heatmap()).await);
        assert!(!cache.exists(&CacheKeys::market_indices()).await);
        assert!(!cache.exists(&CacheKeys::top_movers("1d")).await);
        assert!(!cache.exists(&CacheKeys::top_movers("1w")).await);
        assert!(cache.exists(&CacheKeys::quote("AAPL")).await);
    }
}
