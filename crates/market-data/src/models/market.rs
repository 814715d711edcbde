//! Composite market views: benchmark indices, top movers and news.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Quote;

/// Benchmark index set. Each field is independently nullable so that one
/// upstream being unavailable never hides the other's data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketIndices {
    /// Ibovespa (^BVSP), Brazilian provider
    pub ibovespa: Option<Quote>,
    /// S&P 500 proxy (SPY)
    pub sp500: Option<Quote>,
    /// Nasdaq-100 proxy (QQQ)
    pub nasdaq: Option<Quote>,
    /// Dow Jones proxy (DIA)
    pub dow: Option<Quote>,
}

impl MarketIndices {
    fn slots(&self) -> [&Option<Quote>; 4] {
        [&self.ibovespa, &self.sp500, &self.nasdaq, &self.dow]
    }

    /// Every index has a quote.
    pub fn is_complete(&self) -> bool {
        self.slots().iter().all(|q| q.is_some())
    }

    /// No index has a quote.
    pub fn is_empty(&self) -> bool {
        self.slots().iter().all(|q| q.is_none())
    }
}

/// One entry of the gainers/losers lists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mover {
    /// Display symbol (regional suffix stripped)
    pub symbol: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: u64,
}

impl From<&Quote> for Mover {
    fn from(quote: &Quote) -> Self {
        Self {
            symbol: display_symbol(&quote.symbol),
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
        }
    }
}

/// Strip the Brazilian `.SA` suffix for display.
fn display_symbol(symbol: &str) -> String {
    symbol
        .strip_suffix(".SA")
        .unwrap_or(symbol)
        .to_string()
}

/// Best and worst performers of the movers universe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopMovers {
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
}

/// One cell of the market heatmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapTile {
    /// Display symbol (regional suffix stripped)
    pub symbol: String,
    pub sector: String,
    /// Tile weight. Traded volume stands in for market cap.
    pub weight: u64,
    pub price: Decimal,
    pub change_percent: Decimal,
}

impl HeatmapTile {
    /// Weight used when a quote carries no volume.
    pub const DEFAULT_WEIGHT: u64 = 1_000_000;

    pub fn new(quote: &Quote, sector: impl Into<String>) -> Self {
        Self {
            symbol: display_symbol(&quote.symbol),
            sector: sector.into(),
            weight: if quote.volume > 0 {
                quote.volume
            } else {
                Self::DEFAULT_WEIGHT
            },
            price: quote.price,
            change_percent: quote.change_percent,
        }
    }
}

/// Market news article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: i64,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related: Vec<String>,
}
