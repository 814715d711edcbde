//! Brapi market data provider (Brazilian market).
//!
//! - Quotes via /quote/{symbols} (comma-separated for batches)
//! - Company fundamentals via /quote/{symbol}?fundamental=true
//! - Symbol search via /quote/list
//!
//! Authenticates with a `token` query parameter. API documentation:
//! https://brapi.dev/docs

mod models;

use async_trait::async_trait;
use tracing::debug;
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::{CompanyProfile, Country, Quote, SearchResult, BRAPI_PROVIDER_ID};
use crate::provider::{MarketDataProvider, ProviderAuth, ProviderConfig, ProviderHttp};
use crate::resolver::normalize::{normalize_quote, RawQuote};
use crate::resolver::Market;

use models::{BrapiQuote, ListResponse, QuoteResponse};

pub const BASE_URL: &str = "https://brapi.dev/api";
const PROVIDER_ID: &str = BRAPI_PROVIDER_ID;
const EXCHANGE: &str = "B3";
const SEARCH_LIMIT: usize = 5;

/// Brazilian market provider backed by brapi.dev.
pub struct BrapiProvider {
    http: ProviderHttp,
}

impl BrapiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, MarketDataError> {
        let auth = match &config.api_key {
            Some(token) => ProviderAuth::QueryToken {
                param: "token",
                token: token.clone(),
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

    /// One request for any number of symbols, each percent-encoded on its own
    /// so the separating commas survive.
    async fn fetch_quotes(&self, symbols: &[&str]) -> Result<Vec<BrapiQuote>, MarketDataError> {
        let path = symbols
            .iter()
            .map(|symbol| encode(symbol))
            .collect::<Vec<_>>()
            .join(",");
        let response: QuoteResponse = self
            .http
            .get_json(
                &format!("/quote/{}", path),
                &[("fundamental", "true".to_string())],
            )
            .await?;
        Ok(response.results)
    }

    fn to_quote(requested: &str, stock: BrapiQuote) -> Result<Quote, MarketDataError> {
        normalize_quote(
            RawQuote {
                symbol: requested.to_string(),
                price: stock.regular_market_price,
                previous_close: stock.regular_market_previous_close,
                open: stock.regular_market_open,
                high: stock.regular_market_day_high,
                low: stock.regular_market_day_low,
                volume: stock.regular_market_volume,
                timestamp: None,
                logo: stock.logourl,
            },
            PROVIDER_ID,
        )
    }
}

/// Whether a returned symbol answers a requested one. Brapi may echo
/// `VALE3.SA` back as `VALE3`.
fn answers(requested: &str, returned: &str) -> bool {
    let returned = returned.to_uppercase();
    requested == returned || requested.strip_suffix(".SA") == Some(returned.as_str())
}

#[async_trait]
impl MarketDataProvider for BrapiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn market(&self) -> Market {
        Market::Brazil
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let stock = self
            .fetch_quotes(&[symbol])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
        Self::to_quote(symbol, stock)
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let batch: Vec<&str> = symbols.iter().map(String::as_str).collect();
        let mut remaining: Vec<BrapiQuote> = self.fetch_quotes(&batch).await?;
        debug!("Brapi returned {} of {} symbols", remaining.len(), symbols.len());

        let mut quotes = Vec::with_capacity(symbols.len());
        for requested in symbols {
            let Some(pos) = remaining.iter().position(|s| answers(requested, &s.symbol)) else {
                continue;
            };
            let stock = remaining.swap_remove(pos);
            if let Ok(quote) = Self::to_quote(requested, stock) {
                quotes.push(quote);
            }
        }
        Ok(quotes)
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        let stock = self
            .fetch_quotes(&[symbol])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        let name = stock
            .long_name
            .clone()
            .or_else(|| stock.short_name.clone())
            .unwrap_or_else(|| stock.symbol.clone());
        let summary = stock.summary_profile;

        Ok(CompanyProfile {
            sector: summary.as_ref().and_then(|s| s.sector.clone()),
            industry: summary.as_ref().and_then(|s| s.industry.clone()),
            market_cap: stock.market_cap.filter(|cap| cap.is_finite() && *cap > 0.0),
            description: summary.as_ref().and_then(|s| s.long_business_summary.clone()),
            employees: summary.as_ref().and_then(|s| s.full_time_employees),
            website: summary.as_ref().and_then(|s| s.website.clone()),
            logo: stock.logourl,
            ..CompanyProfile::new(symbol, name, EXCHANGE, PROVIDER_ID)
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let response: ListResponse = self
            .http
            .get_json(
                "/quote/list",
                &[
                    ("search", query.to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                ],
            )
            .await?;

        Ok(response
            .stocks
            .into_iter()
            .map(|item| {
                let description = item.name.unwrap_or_else(|| item.stock.clone());
                SearchResult::new(item.stock, description, "Stock", EXCHANGE, Country::Brazil)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RetryPolicy;
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn provider(server: &MockServer) -> BrapiProvider {
        let config = ProviderConfig {
            retry: RetryPolicy::none(),
            ..ProviderConfig::new(server.base_url()).with_api_key(Some("tok".to_string()))
        };
        BrapiProvider::new(&config).unwrap()
    }

    fn petr4() -> serde_json::Value {
        json!({
            "symbol": "PETR4",
            "regularMarketPrice": 38.5,
            "regularMarketDayHigh": 39.0,
            "regularMarketDayLow": 37.9,
            "regularMarketOpen": 38.0,
            "regularMarketPreviousClose": 37.5,
            "regularMarketVolume": 52000000,
            "logourl": "https://icons.brapi.dev/icons/PETR4.svg",
            "longName": "Petróleo Brasileiro S.A. - Petrobras",
            "shortName": "PETROBRAS PN",
            "marketCap": 500000000000.0,
            "summaryProfile": {
                "longBusinessSummary": "Oil and gas.",
                "website": "https://petrobras.com.br",
                "sector": "Energy",
                "industry": "Oil & Gas Integrated",
                "fullTimeEmployees": 45000
            }
        })
    }

    #[test]
    fn test_answers_accepts_suffix_echo() {
        assert!(answers("VALE3.SA", "VALE3"));
        assert!(answers("PETR4", "petr4"));
        assert!(!answers("PETR4", "PETR3"));
    }

    #[tokio::test]
    async fn test_get_quote_normalizes_payload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/quote/PETR4")
                    .query_param("token", "tok");
                then.status(200).json_body(json!({ "results": [petr4()] }));
            })
            .await;

        let quote = provider(&server).get_quote("PETR4").await.unwrap();

        mock.assert_async().await;
        assert_eq!(quote.symbol, "PETR4");
        assert_eq!(quote.price, dec!(38.5));
        assert_eq!(quote.change, dec!(1.0));
        assert_eq!(quote.change_percent, dec!(2.6667));
        assert_eq!(quote.volume, 52_000_000);
        assert_eq!(quote.source, "BRAPI");
        assert!(quote.logo.is_some());
    }

    #[tokio::test]
    async fn test_empty_results_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/quote/XXXX3");
                then.status(200).json_body(json!({ "results": [] }));
            })
            .await;

        let err = provider(&server).get_quote("XXXX3").await.unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_quotes_maps_back_to_requested_symbols() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/quote/VALE3.SA,PETR4");
                then.status(200).json_body(json!({ "results": [
                    petr4(),
                    { "symbol": "VALE3", "regularMarketPrice": 60.0, "regularMarketPreviousClose": 60.0 }
                ]}));
            })
            .await;

        let symbols = vec!["VALE3.SA".to_string(), "PETR4".to_string()];
        let quotes = provider(&server).get_quotes(&symbols).await.unwrap();

        let returned: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(returned, vec!["VALE3.SA", "PETR4"]);
    }

    #[tokio::test]
    async fn test_batch_members_are_encoded_separately() {
        let server = MockServer::start_async().await;
        let petr4_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/quote/PETR4");
                then.status(200).json_body(json!({ "results": [petr4()] }));
            })
            .await;
        let list_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/quote/list");
                then.status(200).json_body(json!({ "stocks": [] }));
            })
            .await;

        let brapi = provider(&server);
        assert!(brapi.get_quote("PETR4#X").await.is_err());
        assert!(brapi.get_quote("list?search=a").await.is_err());
        let symbols = vec!["PETR4/../list".to_string(), "VALE3".to_string()];
        let _ = brapi.get_quotes(&symbols).await;

        assert_eq!(petr4_mock.hits_async().await, 0);
        assert_eq!(list_mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_get_profile_reads_fundamentals() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/quote/PETR4")
                    .query_param("fundamental", "true");
                then.status(200).json_body(json!({ "results": [petr4()] }));
            })
            .await;

        let profile = provider(&server).get_profile("PETR4").await.unwrap();

        assert_eq!(profile.name, "Petróleo Brasileiro S.A. - Petrobras");
        assert_eq!(profile.exchange, "B3");
        assert_eq!(profile.sector.as_deref(), Some("Energy"));
        assert_eq!(profile.employees, Some(45000));
    }

    #[tokio::test]
    async fn test_search_maps_listings() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/quote/list")
                    .query_param("search", "petr")
                    .query_param("limit", "5");
                then.status(200).json_body(json!({ "stocks": [
                    { "stock": "PETR4", "name": "PETROBRAS PN" },
                    { "stock": "PETR3", "name": "PETROBRAS ON" }
                ]}));
            })
            .await;

        let results = provider(&server).search("petr").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].symbol, "PETR4");
        assert_eq!(results[0].country, Country::Brazil);
        assert_eq!(results[0].exchange, "B3");
    }
}
