//! Process-local [`KeyValueStore`] on a bounded `moka` cache.
//!
//! Used in tests and when no Redis URL is configured. Each entry carries its
//! own TTL; expired entries are evicted by moka's housekeeping.

use std::future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use moka::Expiry;

use super::store::{CacheError, KeyValueStore};

/// Entries kept before moka starts evicting.
pub const DEFAULT_MAX_ENTRIES: u64 = 100_000;

#[derive(Clone, Debug)]
struct Slot {
    value: String,
    /// `None` keeps whatever expiry the key already has
    ttl: Option<Duration>,
}

struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(&self, _key: &String, slot: &Slot, _created_at: Instant) -> Option<Duration> {
        slot.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        slot: &Slot,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        slot.ttl.or(duration_until_expiry)
    }
}

/// In-memory key-value store.
pub struct MemoryStore {
    cache: Cache<String, Slot>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(SlotExpiry)
                .build(),
        }
    }
}

fn parse_counter(key: &str, value: &str) -> Result<u64, CacheError> {
    value
        .parse::<u64>()
        .map_err(|e| CacheError::Backend(format!("value at '{}' is not a counter: {}", key, e)))
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.cache.get(key).await.map(|slot| slot.value))
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.cache.get(key).await.map(|slot| slot.value));
        }
        Ok(values)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.cache
            .insert(key.to_string(), Slot { value, ttl: Some(ttl) })
            .await;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        for key in keys {
            self.cache.invalidate(key).await;
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.as_ref().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.cache.contains_key(key))
    }

    async fn incr_with_expiry(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|current| {
                let op = match current {
                    None => Op::Put(Slot {
                        value: "1".to_string(),
                        ttl: Some(window),
                    }),
                    Some(entry) => match entry.value().value.parse::<u64>() {
                        Ok(count) => Op::Put(Slot {
                            value: (count + 1).to_string(),
                            ttl: None,
                        }),
                        Err(_) => Op::Nop,
                    },
                };
                future::ready(op)
            })
            .await;

        match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                parse_counter(key, &entry.into_value().value)
            }
            CompResult::Unchanged(entry) => parse_counter(key, &entry.into_value().value),
            CompResult::Removed(_) | CompResult::StillNone(_) => Err(CacheError::Backend(format!(
                "counter at '{}' vanished during increment",
                key
            ))),
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Redis-style glob matching supporting `*` (any run) and `?` (one char).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut star_t = 0;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(star_p) = star {
            // backtrack: let the last star swallow one more char
            p = star_p + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
