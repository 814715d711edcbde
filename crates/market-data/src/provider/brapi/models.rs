//! Brapi API response structures.

use serde::Deserialize;

/// Response from /quote/{symbols}
#[derive(Debug, Deserialize)]
pub(super) struct QuoteResponse {
    #[serde(default)]
    pub results: Vec<BrapiQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BrapiQuote {
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_open: Option<f64>,
    pub regular_market_previous_close: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub logourl: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub market_cap: Option<f64>,
    /// Present when requested with `fundamental=true`
    pub summary_profile: Option<SummaryProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SummaryProfile {
    pub long_business_summary: Option<String>,
    pub website: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub full_time_employees: Option<u64>,
}

/// Response from /quote/list
#[derive(Debug, Deserialize)]
pub(super) struct ListResponse {
    #[serde(default)]
    pub stocks: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Listing {
    pub stock: String,
    pub name: Option<String>,
}
