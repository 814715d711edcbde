//! Upstream protection state owned by the gateway.
//!
//! - [`CircuitBreaker`]: per-provider fault isolation
//! - [`RateBudgets`]: per-provider request quotas with hard block

mod circuit_breaker;
mod rate_budget;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_budget::{BudgetSnapshot, RateBudgetConfig, RateBudgets, DEFAULT_MAX_PER_HOUR};
