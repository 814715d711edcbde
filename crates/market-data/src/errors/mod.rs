//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for provider and gateway operations
//! - [`RetryClass`]: Classification for determining how the gateway degrades

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method. None of these escape the public gateway operations except
/// [`MarketDataError::InvalidConfig`], which is raised at construction time.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider rate limited the request (HTTP 429).
    /// Never retried; blocks the provider's budget for a full window.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out on every attempt.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// Connection-level failure or a 5xx that outlived the retries.
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider being called
        provider: String,
        /// Transport error description
        message: String,
    },

    /// A provider-specific error occurred (unexpected status, undecodable body).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The circuit breaker is open for this provider.
    #[error("Circuit open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
    },

    /// The local request budget for this provider is spent.
    #[error("Request budget exhausted: {provider}")]
    BudgetExhausted {
        /// The provider whose budget is exhausted
        provider: String,
    },

    /// The provider does not offer this operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported {
        /// Operation name
        operation: String,
        /// Provider identifier
        provider: String,
    },

    /// The gateway configuration is malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use quotegate_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "TIINGO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::QuotaExceeded);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Absent);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::SymbolNotFound(_) => RetryClass::Absent,

            Self::RateLimited { .. } => RetryClass::QuotaExceeded,

            Self::Timeout { .. } | Self::Network { .. } | Self::ProviderError { .. } => {
                RetryClass::Transient
            }

            Self::CircuitOpen { .. } | Self::BudgetExhausted { .. } | Self::NotSupported { .. } => {
                RetryClass::Skipped
            }

            Self::InvalidConfig(_) => RetryClass::Fatal,
        }
    }
}
