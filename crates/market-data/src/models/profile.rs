use serde::{Deserialize, Serialize};

/// Company profile data from market data providers.
///
/// Completeness depends on the provider: the Brazilian provider fills the
/// fundamentals block, the US provider only exposes daily metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    /// Canonical symbol
    pub symbol: String,

    /// Company name
    pub name: String,

    /// Listing exchange (e.g. "B3", "NASDAQ")
    pub exchange: String,

    /// Business sector (e.g. "Energy")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    /// Industry within sector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Market capitalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,

    /// Business description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Chief executive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceo: Option<String>,

    /// Founding or listing date as reported by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded: Option<String>,

    /// Number of full-time employees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<u64>,

    /// Company website URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Provider that supplied this profile
    pub source: String,
}

impl CompanyProfile {
    /// Create a profile with the always-present identity fields.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        exchange: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            exchange: exchange.into(),
            source: source.into(),
            ..Default::default()
        }
    }
}
