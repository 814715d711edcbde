//! Sliding-hour request budgets for quota-bound upstreams.
//!
//! A budget counts requests in a fixed window starting at the first request
//! after the previous window lapsed. Exhausting the budget, or an upstream
//! 429, blocks the provider until the end of the window. Budgets are
//! independent of the circuit breaker.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::ProviderId;

/// Default budget for the US provider: below the advertised hourly quota.
pub const DEFAULT_MAX_PER_HOUR: u32 = 50;

const HOUR: Duration = Duration::from_secs(3600);

/// Limits of one provider's budget.
#[derive(Clone, Debug)]
pub struct RateBudgetConfig {
    pub max_per_window: u32,
    pub window: Duration,
}

impl RateBudgetConfig {
    pub fn per_hour(max_per_window: u32) -> Self {
        Self {
            max_per_window,
            window: HOUR,
        }
    }
}

impl Default for RateBudgetConfig {
    fn default() -> Self {
        Self::per_hour(DEFAULT_MAX_PER_HOUR)
    }
}

#[derive(Debug)]
struct RateBudget {
    config: RateBudgetConfig,
    window_start: Instant,
    request_count: u32,
    blocked_until: Option<Instant>,
}

impl RateBudget {
    fn new(config: RateBudgetConfig) -> Self {
        Self {
            config,
            window_start: Instant::now(),
            request_count: 0,
            blocked_until: None,
        }
    }

    fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    fn roll_window(&mut self, now: Instant) {
        if now.duration_since(self.window_start) > self.config.window {
            self.window_start = now;
            self.request_count = 0;
            self.blocked_until = None;
        }
    }
}

/// Read-only view of a budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub max_per_window: u32,
    pub used: u32,
    pub remaining: u32,
    pub blocked: bool,
    /// Time left until the block lifts
    pub blocked_for: Option<Duration>,
}

/// Per-provider budgets. Providers without a budget always pass.
#[derive(Default)]
pub struct RateBudgets {
    budgets: Mutex<HashMap<String, RateBudget>>,
}

impl RateBudgets {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_budgets(&self) -> MutexGuard<'_, HashMap<String, RateBudget>> {
        self.budgets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate budget mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Install (or replace) the budget for a provider.
    pub fn configure(&self, provider: &ProviderId, config: RateBudgetConfig) {
        debug!(
            "Rate budget for '{}': {} requests per {:?}",
            provider, config.max_per_window, config.window
        );
        self.lock_budgets()
            .insert(provider.to_string(), RateBudget::new(config));
    }

    /// Take one request from the provider's budget.
    ///
    /// Returns false while blocked or once the window's allowance is spent;
    /// the latter blocks the provider until the window ends.
    pub fn try_consume(&self, provider: &ProviderId) -> bool {
        let now = Instant::now();
        let mut budgets = self.lock_budgets();
        let Some(budget) = budgets.get_mut(provider.as_ref()) else {
            return true;
        };

        if budget.is_blocked(now) {
            return false;
        }

        budget.roll_window(now);

        if budget.request_count >= budget.config.max_per_window {
            budget.blocked_until = Some(budget.window_start + budget.config.window);
            warn!(
                "Rate budget exhausted for '{}' ({} requests), blocked until window end",
                provider, budget.request_count
            );
            return false;
        }

        budget.request_count += 1;
        true
    }

    /// Block the provider for a full window from now. Called on HTTP 429.
    pub fn block_for_window(&self, provider: &ProviderId) {
        let now = Instant::now();
        let mut budgets = self.lock_budgets();
        if let Some(budget) = budgets.get_mut(provider.as_ref()) {
            budget.blocked_until = Some(now + budget.config.window);
            warn!(
                "Upstream throttled '{}', blocking for {:?}",
                provider, budget.config.window
            );
        }
    }

    /// Administrative override: fresh window, no block.
    pub fn reset(&self, provider: &ProviderId) {
        let mut budgets = self.lock_budgets();
        if let Some(budget) = budgets.get_mut(provider.as_ref()) {
            info!("Rate budget for '{}' manually reset", provider);
            *budget = RateBudget::new(budget.config.clone());
        }
    }

    pub fn snapshot(&self, provider: &ProviderId) -> Option<BudgetSnapshot> {
        let now = Instant::now();
        let budgets = self.lock_budgets();
        let budget = budgets.get(provider.as_ref())?;

        let window_lapsed = now.duration_since(budget.window_start) > budget.config.window;
        let used = if window_lapsed { 0 } else { budget.request_count };
        let blocked_for = budget
            .blocked_until
            .filter(|until| now < *until)
            .map(|until| until.duration_since(now));

        Some(BudgetSnapshot {
            max_per_window: budget.config.max_per_window,
            used,
            remaining: budget.config.max_per_window.saturating_sub(used),
            blocked: blocked_for.is_some(),
            blocked_for,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    const TIINGO: ProviderId = Cow::Borrowed("TIINGO");

    fn budgets(max: u32, window: Duration) -> RateBudgets {
        let budgets = RateBudgets::new();
        budgets.configure(
            &TIINGO,
            RateBudgetConfig {
                max_per_window: max,
                window,
            },
        );
        budgets
    }

    #[test]
    fn test_unbudgeted_provider_always_passes() {
        let budgets = RateBudgets::new();
        let brapi: ProviderId = Cow::Borrowed("BRAPI");
        for _ in 0..1000 {
            assert!(budgets.try_consume(&brapi));
        }
        assert!(budgets.snapshot(&brapi).is_none());
    }

    #[test]
    fn test_exhaustion_after_max_requests() {
        let budgets = budgets(50, HOUR);

        for _ in 0..50 {
            assert!(budgets.try_consume(&TIINGO));
        }
        assert!(!budgets.try_consume(&TIINGO));

        let snapshot = budgets.snapshot(&TIINGO).unwrap();
        assert_eq!(snapshot.used, 50);
        assert_eq!(snapshot.remaining, 0);
        assert!(snapshot.blocked);

        // Stays denied for the remainder of the window
        assert!(!budgets.try_consume(&TIINGO));
    }

    #[test]
    fn test_window_rolls_over() {
        let budgets = budgets(2, Duration::from_millis(20));

        assert!(budgets.try_consume(&TIINGO));
        assert!(budgets.try_consume(&TIINGO));
        assert!(!budgets.try_consume(&TIINGO));

        std::thread::sleep(Duration::from_millis(30));
        assert!(budgets.try_consume(&TIINGO));
    }

    #[test]
    fn test_block_for_window_denies_with_budget_left() {
        let budgets = budgets(50, HOUR);
        assert!(budgets.try_consume(&TIINGO));

        budgets.block_for_window(&TIINGO);
        assert!(!budgets.try_consume(&TIINGO));

        let snapshot = budgets.snapshot(&TIINGO).unwrap();
        assert!(snapshot.blocked);
        assert_eq!(snapshot.used, 1);
    }

    #[test]
    fn test_reset_clears_block_and_count() {
        let budgets = budgets(1, HOUR);
        assert!(budgets.try_consume(&TIINGO));
        assert!(!budgets.try_consume(&TIINGO));

        budgets.reset(&TIINGO);
        let snapshot = budgets.snapshot(&TIINGO).unwrap();
        assert_eq!(snapshot.remaining, 1);
        assert!(!snapshot.blocked);
        assert!(budgets.try_consume(&TIINGO));
    }
}
