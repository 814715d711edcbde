//! Tiingo market data provider (US market).
//!
//! - Quotes via /iex/{ticker} and batched /iex/?tickers=a,b
//! - Company metadata via /tiingo/daily/{ticker}
//! - Symbol search via /tiingo/utilities/search
//! - News via /tiingo/news
//!
//! Authenticates with `Authorization: Token {key}`. The free tier enforces a
//! hard hourly quota and answers 429 once it is spent.
//! API documentation: https://www.tiingo.com/documentation

mod models;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::{CompanyProfile, Country, NewsArticle, Quote, SearchResult, TIINGO_PROVIDER_ID};
use crate::provider::{MarketDataProvider, ProviderAuth, ProviderConfig, ProviderHttp};
use crate::resolver::normalize::{normalize_quote, RawQuote};
use crate::resolver::Market;

use models::{DailyMeta, IexQuote, NewsItem, SearchItem};

pub const BASE_URL: &str = "https://api.tiingo.com";
const PROVIDER_ID: &str = TIINGO_PROVIDER_ID;
const SEARCH_LIMIT: usize = 5;

/// US market provider backed by api.tiingo.com.
pub struct TiingoProvider {
    http: ProviderHttp,
}

impl TiingoProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, MarketDataError> {
        let auth = match &config.api_key {
            Some(key) => ProviderAuth::Header {
                name: "Authorization",
                value: format!("Token {}", key),
            },
            None => ProviderAuth::None,
        };
        let http = ProviderHttp::new(
            PROVIDER_ID,
            config.base_url.clone(),
            auth,
            config.timeout,
            config.retry.clone(),
        )?;
        Ok(Self { http })
    }

    fn to_quote(item: IexQuote) -> Result<Quote, MarketDataError> {
        // `last` is null or 0 outside IEX trading hours
        let price = item
            .last
            .filter(|p| *p > 0.0)
            .or(item.tngo_last);

        normalize_quote(
            RawQuote {
                symbol: item.ticker.to_uppercase(),
                price,
                previous_close: item.prev_close,
                open: item.open.filter(|v| *v > 0.0),
                high: item.high.filter(|v| *v > 0.0),
                low: item.low.filter(|v| *v > 0.0),
                volume: item.volume,
                // freshness is judged by capture time, not the last IEX print
                timestamp: None,
                logo: None,
            },
            PROVIDER_ID,
        )
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[async_trait]
impl MarketDataProvider for TiingoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn market(&self) -> Market {
        Market::UnitedStates
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let items: Vec<IexQuote> = self
            .http
            .get_json(&format!("/iex/{}", encode(symbol)), &[])
            .await?;

        let item = items
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
        Self::to_quote(item)
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let items: Vec<IexQuote> = self
            .http
            .get_json("/iex/", &[("tickers", symbols.join(","))])
            .await?;
        debug!("Tiingo returned {} of {} tickers", items.len(), symbols.len());

        Ok(items
            .into_iter()
            .filter_map(|item| Self::to_quote(item).ok())
            .collect())
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        let meta: DailyMeta = self
            .http
            .get_json(&format!("/tiingo/daily/{}", encode(symbol)), &[])
            .await?;

        let name = meta.name.clone().unwrap_or_else(|| meta.ticker.clone());
        let exchange = meta.exchange_code.unwrap_or_else(|| "US".to_string());

        Ok(CompanyProfile {
            description: meta.description.filter(|d| !d.trim().is_empty()),
            founded: meta.start_date,
            ..CompanyProfile::new(symbol, name, exchange, PROVIDER_ID)
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let items: Vec<SearchItem> = self
            .http
            .get_json(
                "/tiingo/utilities/search",
                &[
                    ("query", query.to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                ],
            )
            .await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let description = item.name.unwrap_or_else(|| item.ticker.clone());
                SearchResult::new(
                    item.ticker.to_uppercase(),
                    description,
                    item.asset_type.unwrap_or_else(|| "Stock".to_string()),
                    item.exchange_code.unwrap_or_else(|| "US".to_string()),
                    Country::UnitedStates,
                )
            })
            .collect())
    }

    async fn get_news(&self, limit: usize) -> Result<Vec<NewsArticle>, MarketDataError> {
        let items: Vec<NewsItem> = self
            .http
            .get_json("/tiingo/news", &[("limit", limit.to_string())])
            .await?;

        Ok(items
            .into_iter()
            .map(|item| NewsArticle {
                id: item.id,
                headline: item.title,
                summary: item.description.unwrap_or_default(),
                source: item.source.unwrap_or_default(),
                url: item.url,
                published_at: item.published_date.as_deref().and_then(parse_timestamp),
                related: item.tickers.into_iter().map(|t| t.to_uppercase()).collect(),
            })
            .collect())
    }
}
