//! Cache layer over a remote key-value store.
//!
//! - [`KeyValueStore`]: backend seam, implemented by [`RedisStore`] and [`MemoryStore`]
//! - [`CacheLayer`]: typed, fail-soft JSON cache used by the gateway
//! - [`CacheKeys`] / [`CacheTtl`]: key naming scheme and retention tiers

mod keys;
mod layer;
mod memory;
mod redis_store;
mod store;

pub use keys::{CacheKeys, CacheTtl};
pub use layer::CacheLayer;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{CacheError, KeyValueStore};
