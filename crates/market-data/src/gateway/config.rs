use std::time::Duration;

use crate::cache::CacheTtl;
use crate::errors::MarketDataError;
use crate::provider::{brapi, tiingo, ProviderConfig};
use crate::registry::{CircuitBreakerConfig, RateBudgetConfig};

/// Pause between the per-symbol requests of a Brazilian batch.
pub const DEFAULT_BR_BATCH_DELAY: Duration = Duration::from_millis(100);

/// Configuration of a [`MarketGateway`](super::MarketGateway).
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Brazilian-market upstream
    pub brapi: ProviderConfig,
    /// US-market upstream
    pub tiingo: ProviderConfig,
    /// Applied to each provider independently
    pub circuit_breaker: CircuitBreakerConfig,
    /// Request budget of the US upstream. `None` disables it.
    pub tiingo_budget: Option<RateBudgetConfig>,
    pub br_batch_delay: Duration,
    /// Age after which a cached quote is refetched
    pub quote_fresh_for: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            brapi: ProviderConfig::new(brapi::BASE_URL),
            tiingo: ProviderConfig::new(tiingo::BASE_URL),
            circuit_breaker: CircuitBreakerConfig::default(),
            tiingo_budget: Some(RateBudgetConfig::default()),
            br_batch_delay: DEFAULT_BR_BATCH_DELAY,
            quote_fresh_for: CacheTtl::Hot.duration(),
        }
    }
}

impl GatewayConfig {
    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        for (name, provider) in [("brapi", &self.brapi), ("tiingo", &self.tiingo)] {
            if !(provider.base_url.starts_with("http://") || provider.base_url.starts_with("https://")) {
                return Err(MarketDataError::InvalidConfig(format!(
                    "{} base URL must be http(s): '{}'",
                    name, provider.base_url
                )));
            }
            if provider.timeout.is_zero() {
                return Err(MarketDataError::InvalidConfig(format!(
                    "{} timeout must be > 0",
                    name
                )));
            }
        }

        if self.circuit_breaker.failure_threshold == 0
            || self.circuit_breaker.half_open_success_threshold == 0
        {
            return Err(MarketDataError::InvalidConfig(
                "circuit breaker thresholds must be > 0".to_string(),
            ));
        }

        if let Some(budget) = &self.tiingo_budget {
            if budget.max_per_window == 0 || budget.window.is_zero() {
                return Err(MarketDataError::InvalidConfig(
                    "rate budget needs max_per_window > 0 and a non-empty window".to_string(),
                ));
            }
        }

        if self.quote_fresh_for.is_zero() {
            return Err(MarketDataError::InvalidConfig(
                "quote freshness window must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiingo_budget.as_ref().map(|b| b.max_per_window), Some(50));
        assert_eq!(config.br_batch_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let config = GatewayConfig {
            tiingo_budget: Some(RateBudgetConfig::per_hour(0)),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MarketDataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = GatewayConfig {
            brapi: ProviderConfig::new("ftp://brapi.dev"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
