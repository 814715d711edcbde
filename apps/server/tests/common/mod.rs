#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use quotegate_market_data::errors::MarketDataError;
use quotegate_market_data::resolver::normalize::{normalize_quote, RawQuote};
use quotegate_market_data::{
    CacheLayer, CompanyProfile, Country, GatewayConfig, Market, MarketDataProvider,
    MarketGateway, NewsArticle, Quote, SearchResult,
};
use quotegate_server::{api::app_router, config::Config, AppState};
use serde_json::Value;
use tower::ServiceExt;

/// Provider answering from a fixed price table.
pub struct StubProvider {
    id: &'static str,
    market: Market,
    prices: HashMap<&'static str, (f64, f64)>,
}

impl StubProvider {
    pub fn brazil() -> Arc<Self> {
        Arc::new(Self {
            id: "BR_STUB",
            market: Market::Brazil,
            prices: HashMap::from([("PETR4", (38.5, 37.5)), ("^BVSP", (128000.0, 127500.0))]),
        })
    }

    pub fn us() -> Arc<Self> {
        Arc::new(Self {
            id: "US_STUB",
            market: Market::UnitedStates,
            prices: HashMap::from([
                ("AAPL", (190.0, 188.0)),
                ("SPY", (500.0, 498.0)),
                ("QQQ", (430.0, 432.0)),
                ("DIA", (390.0, 389.0)),
            ]),
        })
    }

    fn quote_for(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let (price, prev) = self
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
        normalize_quote(
            RawQuote {
                symbol: symbol.to_string(),
                price: Some(price),
                previous_close: Some(prev),
                volume: Some(5000.0),
                ..Default::default()
            },
            self.id,
        )
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn market(&self) -> Market {
        self.market
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.quote_for(symbol)
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        Ok(symbols.iter().filter_map(|s| self.quote_for(s).ok()).collect())
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        self.quote_for(symbol)?;
        Ok(CompanyProfile::new(symbol, format!("{} Inc", symbol), "STUB", self.id))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let country = match self.market {
            Market::Brazil => Country::Brazil,
            Market::UnitedStates => Country::UnitedStates,
        };
        let query = query.to_uppercase();
        Ok(self
            .prices
            .keys()
            .filter(|symbol| symbol.contains(query.as_str()))
            .map(|symbol| SearchResult::new(*symbol, format!("{} Inc", symbol), "Stock", "STUB", country))
            .collect())
    }

    async fn get_news(&self, limit: usize) -> Result<Vec<NewsArticle>, MarketDataError> {
        Ok((0..limit.min(4))
            .map(|i| NewsArticle {
                id: i as i64,
                headline: format!("Story {}", i),
                summary: String::new(),
                source: "stub".to_string(),
                url: format!("https://news.example/{}", i),
                published_at: None,
                related: Vec::new(),
            })
            .collect())
    }
}

pub fn router_with(config: Config) -> Router {
    let gateway_config = GatewayConfig {
        br_batch_delay: Duration::ZERO,
        ..GatewayConfig::default()
    };
    let gateway = MarketGateway::with_providers(
        gateway_config,
        CacheLayer::in_memory(),
        StubProvider::brazil(),
        StubProvider::us(),
    )
    .unwrap();
    let state = Arc::new(AppState::new(gateway, &config));
    app_router(state, &config).unwrap()
}

pub fn router() -> Router {
    router_with(Config::default())
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = get(app, uri).await;
    let status = response.status();
    (status, json_body(response).await)
}
