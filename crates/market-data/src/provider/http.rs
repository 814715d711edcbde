//! Shared HTTP client for provider adapters.
//!
//! Wraps `reqwest` with a base URL, an authentication strategy and the retry
//! interceptor every upstream call goes through:
//!
//! - timeouts, connection failures and 5xx are retried with capped
//!   exponential backoff
//! - 429 is surfaced immediately as [`MarketDataError::RateLimited`]
//! - 404 is surfaced as [`MarketDataError::SymbolNotFound`]
//! - any other non-success status is a [`MarketDataError::ProviderError`]

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::MarketDataError;

/// Default per-call timeout for upstream requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// How credentials are attached to upstream requests.
#[derive(Clone, Debug)]
pub enum ProviderAuth {
    /// No credentials
    None,
    /// Credential sent as a query parameter (e.g. `?token=...`)
    QueryToken { param: &'static str, token: String },
    /// Credential sent as a request header (e.g. `Authorization: Token ...`)
    Header { name: &'static str, value: String },
}

/// Retry schedule for transient upstream failures.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// HTTP client bound to one upstream.
#[derive(Clone, Debug)]
pub struct ProviderHttp {
    provider: &'static str,
    client: Client,
    base_url: String,
    auth: ProviderAuth,
    retry: RetryPolicy,
}

impl ProviderHttp {
    pub fn new(
        provider: &'static str,
        base_url: impl Into<String>,
        auth: ProviderAuth,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            MarketDataError::InvalidConfig(format!("{}: failed to build HTTP client: {}", provider, e))
        })?;

        Ok(Self {
            provider,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            retry,
        })
    }

    /// GET `path` and decode the JSON body, retrying transient failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketDataError> {
        let mut attempt = 0;
        loop {
            match self.send_once(path, query).await {
                Err(err) if is_retryable(&err) && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        provider = self.provider,
                        path,
                        attempt,
                        ?delay,
                        "Transient upstream failure, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
                Ok(body) => return self.decode(path, &body),
            }
        }
    }

    async fn send_once(&self, path: &str, query: &[(&str, String)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);

        request = match &self.auth {
            ProviderAuth::None => request,
            ProviderAuth::QueryToken { param, token } => request.query(&[(*param, token.as_str())]),
            ProviderAuth::Header { name, value } => request.header(*name, value.as_str()),
        };

        debug!(provider = self.provider, path, "Upstream request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: self.provider.to_string(),
                }
            } else {
                MarketDataError::Network {
                    provider: self.provider.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: self.provider.to_string(),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(path.to_string()));
        }

        if status.is_server_error() {
            return Err(MarketDataError::Network {
                provider: self.provider.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: self.provider.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: self.provider.to_string(),
                }
            } else {
                MarketDataError::Network {
                    provider: self.provider.to_string(),
                    message: format!("Failed to read response: {}", e),
                }
            }
        })
    }

    fn decode<T: DeserializeOwned>(&self, path: &str, body: &str) -> Result<T, MarketDataError> {
        serde_json::from_str(body).map_err(|e| MarketDataError::ProviderError {
            provider: self.provider.to_string(),
            message: format!("Failed to parse response from {}: {}", path, e),
        })
    }
}

/// Only transport failures and 5xx are worth another attempt.
fn is_retryable(err: &MarketDataError) -> bool {
    matches!(
        err,
        MarketDataError::Timeout { .. } | MarketDataError::Network { .. }
    )
}
