/// Classification for how the gateway reacts to a provider error.
///
/// # Behavior Summary
///
/// | Class | Record Circuit Breaker Failure? | Gateway answer |
/// |-------|--------------------------------|----------------|
/// | `Transient` | Yes | Stale cache, else absent |
/// | `QuotaExceeded` | No (budget is hard-blocked instead) | Stale cache, else absent |
/// | `Absent` | No | Absent |
/// | `Skipped` | No | Stale cache, else absent |
/// | `Fatal` | No | Construction fails |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Timeout, network failure or 5xx that survived the retry interceptor.
    /// Counts against the provider's circuit.
    Transient,

    /// The upstream answered HTTP 429.
    ///
    /// The upstream itself is healthy, only throttled, so the circuit is left
    /// alone and the provider's rate budget is blocked for a full window.
    QuotaExceeded,

    /// Valid request, no data. Treated as an absent result.
    Absent,

    /// The call never reached the network (circuit open, budget exhausted,
    /// operation not supported by the provider).
    Skipped,

    /// Local invariant violation such as a malformed configuration.
    Fatal,
}
