use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical quote shape every provider payload is normalized into.
///
/// Quotes are immutable snapshots: a newer fetch supersedes, never mutates,
/// an older one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Canonical uppercase identifier (e.g. "PETR4", "AAPL")
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// Absolute change against the previous close
    pub change: Decimal,

    /// Percentage change against the previous close (0 when no previous close)
    pub change_percent: Decimal,

    /// Session high
    pub high: Decimal,

    /// Session low
    pub low: Decimal,

    /// Session open
    pub open: Decimal,

    /// Previous session close
    pub previous_close: Decimal,

    /// Traded volume
    pub volume: u64,

    /// Instant the quote was captured from the upstream
    pub timestamp: DateTime<Utc>,

    /// Logo URL when the provider supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Provider that produced the quote (BRAPI, TIINGO)
    pub source: String,

    /// Set when the quote is served from cache past its freshness window
    /// because the upstream could not be reached.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_stale: bool,
}

impl Quote {
    /// Whether the quote was captured within `fresh_for` of `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, fresh_for: Duration) -> bool {
        now.signed_duration_since(self.timestamp) <= fresh_for
    }

    /// Mark this quote as a stale fallback. Market fields are left untouched.
    pub fn into_stale(mut self) -> Self {
        self.is_stale = true;
        self
    }
}
