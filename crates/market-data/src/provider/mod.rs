//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - `ProviderHttp`, the retrying HTTP client shared by the adapters
//! - Concrete adapters for the Brazilian (Brapi) and US (Tiingo) markets

mod http;
mod traits;

pub mod brapi;
pub mod tiingo;

pub use http::{ProviderAuth, ProviderHttp, RetryPolicy, DEFAULT_TIMEOUT};
pub use traits::MarketDataProvider;

use std::time::Duration;

/// Endpoint settings of one upstream.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// API token or key. Requests are sent unauthenticated when absent.
    pub api_key: Option<String>,
    /// Per-call timeout
    pub timeout: Duration,
    /// Retry schedule for transient failures
    pub retry: RetryPolicy,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }
}
