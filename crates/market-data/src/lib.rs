//! Quotegate Market Data Crate
//!
//! Market data aggregation over a Brazilian-market and a US-market upstream,
//! with caching, fault isolation and quota protection.
//!
//! # Architecture
//!
//! ```text
//!                          +------------------+
//!                          |  MarketGateway   |  (aggregation API)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   CacheLayer     |  (fresh? / stale fallback)
//!                          +------------------+
//!                                  | miss
//!                                  v
//!                 +---------------------------------+
//!                 | CircuitBreaker -> RateBudgets   |  (per provider)
//!                 +---------------------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Resolver      |  (route by identifier shape)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Provider      |  (Brapi, Tiingo)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |     Quote        |  (canonical shape)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketGateway`] - Aggregation API: quotes, profiles, search, market views
//! - [`CacheLayer`] - Typed, fail-soft cache over a [`KeyValueStore`]
//! - [`Quote`] - Canonical quote with decimal prices
//! - [`MarketDataProvider`] - Upstream adapter trait
//!
//! # Type Aliases
//!
//! - [`ProviderId`] - Provider identifier (e.g., "BRAPI", "TIINGO")

pub mod cache;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;

// Re-export all public types from models
pub use models::{
    CompanyProfile, Country, HeatmapTile, MarketIndices, Mover, NewsArticle, ProviderId, Quote,
    SearchResult, TopMovers, BRAPI_PROVIDER_ID, TIINGO_PROVIDER_ID,
};

// Re-export cache types
pub use cache::{CacheKeys, CacheLayer, CacheTtl, KeyValueStore, MemoryStore, RedisStore};

// Re-export gateway types
pub use gateway::{GatewayConfig, GatewayStatus, MarketGateway, ProviderStatus, MAX_NEWS_ARTICLES};

// Re-export resolver types
pub use resolver::{is_valid_symbol, normalize_symbol, route_for, split_by_market, Market};

// Re-export provider types
pub use provider::brapi::BrapiProvider;
pub use provider::tiingo::TiingoProvider;
pub use provider::{MarketDataProvider, ProviderConfig, RetryPolicy};

// Re-export registry types
pub use registry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RateBudgetConfig, RateBudgets};

pub use errors::{MarketDataError, RetryClass};
