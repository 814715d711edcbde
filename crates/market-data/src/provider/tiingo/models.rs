//! Tiingo API response structures.

use serde::Deserialize;

/// Element of the /iex response array
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IexQuote {
    pub ticker: String,
    /// Last IEX trade, null outside market hours
    pub last: Option<f64>,
    /// Tiingo's composite last price
    pub tngo_last: Option<f64>,
    pub prev_close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
    pub volume: Option<f64>,
}

/// Response from /tiingo/daily/{ticker}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DailyMeta {
    pub ticker: String,
    pub name: Option<String>,
    pub exchange_code: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
}

/// Element of the /tiingo/utilities/search response array
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchItem {
    pub ticker: String,
    pub name: Option<String>,
    pub asset_type: Option<String>,
    pub exchange_code: Option<String>,
}

/// Element of the /tiingo/news response array
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewsItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub source: Option<String>,
    pub url: String,
    pub published_date: Option<String>,
    #[serde(default)]
    pub tickers: Vec<String>,
}
