//! Search result models for symbol lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Country of listing. Each search result belongs to exactly one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "BR")]
    Brazil,
    #[serde(rename = "US")]
    UnitedStates,
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brazil => write!(f, "BR"),
            Self::UnitedStates => write!(f, "US"),
        }
    }
}

/// Result from a ticker/symbol search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Symbol/ticker (e.g., "PETR4", "AAPL")
    pub symbol: String,

    /// Human-readable description (usually the company name)
    pub description: String,

    /// Instrument type (e.g., "Stock", "ETF")
    #[serde(rename = "type")]
    pub instrument_type: String,

    /// Exchange (e.g., "B3", "NASDAQ")
    pub exchange: String,

    /// Country of listing
    pub country: Country,
}

impl SearchResult {
    /// Create a new search result.
    pub fn new(
        symbol: impl Into<String>,
        description: impl Into<String>,
        instrument_type: impl Into<String>,
        exchange: impl Into<String>,
        country: Country,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            description: description.into(),
            instrument_type: instrument_type.into(),
            exchange: exchange.into(),
            country,
        }
    }
}
