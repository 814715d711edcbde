//! Per-provider circuit breaker.
//!
//! Each provider id owns an independent tri-state circuit:
//!
//! - **Closed**: calls flow; consecutive transient failures are counted.
//! - **Open**: calls are refused until the recovery timeout has elapsed
//!   since the last failure.
//! - **HalfOpen**: calls pass as probes; enough successes close the
//!   circuit, any failure reopens it.
//!
//! State is in-memory, owned by the gateway instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::models::ProviderId;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_HALF_OPEN_SUCCESS_THRESHOLD: u32 = 3;

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    last_failure: Option<Instant>,
}

impl Circuit {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            half_open_successes: 0,
            last_failure: None,
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.half_open_successes = 0;
        self.last_failure = Some(now);
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open a closed circuit.
    pub failure_threshold: u32,
    /// Cool-down measured from the last failure before probing.
    pub recovery_timeout: Duration,
    /// Probe successes that close a half-open circuit.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: DEFAULT_HALF_OPEN_SUCCESS_THRESHOLD,
        }
    }
}

/// Thread-safe map of per-provider circuits.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the circuit map. A poisoned lock is recovered; a slightly
    /// inaccurate circuit is preferable to a panic on the request path.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether a call to `provider` may proceed.
    ///
    /// Moves an open circuit to half-open once the recovery timeout has
    /// elapsed since the last failure.
    pub fn is_allowed(&self, provider: &ProviderId) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::closed);

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = circuit
                    .last_failure
                    .is_some_and(|at| at.elapsed() > self.config.recovery_timeout);
                if cooled_down {
                    info!("Circuit breaker: '{}' OPEN -> HALF_OPEN", provider);
                    circuit.state = CircuitState::HalfOpen;
                    circuit.consecutive_failures = 0;
                    circuit.half_open_successes = 0;
                }
                cooled_down
            }
        }
    }

    pub fn record_success(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::closed);

        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                circuit.half_open_successes += 1;
                debug!(
                    "Circuit breaker: '{}' probe succeeded ({}/{})",
                    provider, circuit.half_open_successes, self.config.half_open_success_threshold
                );
                if circuit.half_open_successes >= self.config.half_open_success_threshold {
                    info!("Circuit breaker: '{}' HALF_OPEN -> CLOSED", provider);
                    *circuit = Circuit::closed();
                }
            }
            CircuitState::Open => {
                // a call admitted before the circuit opened finished late
                debug!("Circuit breaker: late success for '{}' while OPEN", provider);
            }
        }
    }

    /// Record a transient failure.
    pub fn record_failure(&self, provider: &ProviderId) {
        let now = Instant::now();
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::closed);

        circuit.consecutive_failures += 1;

        match circuit.state {
            CircuitState::Closed => {
                if circuit.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        "Circuit breaker: '{}' CLOSED -> OPEN after {} consecutive failures",
                        provider, circuit.consecutive_failures
                    );
                    circuit.open(now);
                } else {
                    circuit.last_failure = Some(now);
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        provider, circuit.consecutive_failures, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                warn!("Circuit breaker: '{}' HALF_OPEN -> OPEN, probe failed", provider);
                circuit.open(now);
            }
            CircuitState::Open => {
                circuit.last_failure = Some(now);
            }
        }
    }

    pub fn state(&self, provider: &ProviderId) -> CircuitState {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn failure_count(&self, provider: &ProviderId) -> u32 {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(|c| c.consecutive_failures)
            .unwrap_or(0)
    }

    /// Force a provider's circuit back to CLOSED.
    pub fn reset(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        if let Some(circuit) = circuits.get_mut(provider.as_ref()) {
            info!("Circuit breaker: manual reset for '{}'", provider);
            *circuit = Circuit::closed();
        }
    }

    pub fn reset_all(&self) {
        self.lock_circuits().clear();
        info!("Circuit breaker: all circuits reset");
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn fast_config(failure_threshold: u32, half_open_success_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout: Duration::from_millis(10),
            half_open_success_threshold,
        }
    }

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("TIINGO");

        assert!(cb.is_allowed(&provider));
        assert_eq!(cb.state(&provider), CircuitState::Closed);
    }

    #[test]
    fn test_default_thresholds() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(60));
        assert_eq!(config.half_open_success_threshold, 3);
    }

    #[test]
    fn test_five_consecutive_failures_open_the_circuit() {
        let cb = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("BRAPI");

        for _ in 0..4 {
            cb.record_failure(&provider);
        }
        assert!(cb.is_allowed(&provider));
        assert_eq!(cb.state(&provider), CircuitState::Closed);

        cb.record_failure(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Open);
        assert!(!cb.is_allowed(&provider));
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let cb = CircuitBreaker::new();
        let provider: ProviderId = Cow::Borrowed("INTERMITTENT");

        for _ in 0..4 {
            cb.record_failure(&provider);
        }
        cb.record_success(&provider);
        assert_eq!(cb.failure_count(&provider), 0);

        // Four more failures are not enough after the reset
        for _ in 0..4 {
            cb.record_failure(&provider);
        }
        assert_eq!(cb.state(&provider), CircuitState::Closed);
    }

    #[test]
    fn test_open_circuit_refuses_before_cooldown() {
        let cb = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_secs(60),
            half_open_success_threshold: 3,
        });
        let provider: ProviderId = Cow::Borrowed("COOLING");

        cb.record_failure(&provider);
        assert!(!cb.is_allowed(&provider));
        assert!(!cb.is_allowed(&provider));
        assert_eq!(cb.state(&provider), CircuitState::Open);
    }

    #[test]
    fn test_half_open_needs_three_successes_to_close() {
        let cb = CircuitBreaker::with_config(fast_config(1, 3));
        let provider: ProviderId = Cow::Borrowed("HEALING");

        cb.record_failure(&provider);
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.is_allowed(&provider));
        assert_eq!(cb.state(&provider), CircuitState::HalfOpen);

        cb.record_success(&provider);
        cb.record_success(&provider);
        assert_eq!(cb.state(&provider), CircuitState::HalfOpen);

        cb.record_success(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Closed);
        assert_eq!(cb.failure_count(&provider), 0);
    }

    #[test]
    fn test_half_open_failure_reopens_and_restarts_cooldown() {
        let cb = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_millis(50),
            half_open_success_threshold: 3,
        });
        let provider: ProviderId = Cow::Borrowed("RELAPSING");

        cb.record_failure(&provider);
        std::thread::sleep(Duration::from_millis(60));
        assert!(cb.is_allowed(&provider));
        cb.record_success(&provider);

        cb.record_failure(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Open);
        // Cool-down restarted at the probe failure
        assert!(!cb.is_allowed(&provider));
    }

    #[test]
    fn test_manual_reset() {
        let cb = CircuitBreaker::with_config(fast_config(1, 3));
        let provider: ProviderId = Cow::Borrowed("RESET");

        cb.record_failure(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Open);

        cb.reset(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Closed);
        assert!(cb.is_allowed(&provider));
    }

    #[test]
    fn test_provider_isolation() {
        let cb = CircuitBreaker::with_config(fast_config(1, 3));
        let brapi: ProviderId = Cow::Borrowed("BRAPI");
        let tiingo: ProviderId = Cow::Borrowed("TIINGO");

        cb.record_failure(&tiingo);
        assert!(!cb.is_allowed(&tiingo));
        assert!(cb.is_allowed(&brapi));
    }
}
