//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use quotegate_market_data::errors::MarketDataError;
use quotegate_market_data::resolver::normalize::{normalize_quote, RawQuote};
use quotegate_market_data::{
    CacheKeys, CacheLayer, CacheTtl, CompanyProfile, Country, GatewayConfig, Market,
    MarketDataProvider, MarketGateway, NewsArticle, Quote, SearchResult,
};

/// How a scripted provider answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Answers from its price table
    Healthy,
    /// Every call fails with a transient network error
    Failing,
    /// Every call is answered with HTTP 429
    Throttled,
}

/// Provider answering from an in-memory price table, counting its calls.
pub struct ScriptedProvider {
    id: &'static str,
    market: Market,
    mode: Mutex<Mode>,
    /// symbol -> (price, previous close)
    prices: HashMap<String, (f64, f64)>,
    pub quote_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub news_calls: AtomicUsize,
    /// `limit` passed on the most recent news call
    pub last_news_limit: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(id: &'static str, market: Market, prices: &[(&str, f64, f64)]) -> Self {
        Self {
            id,
            market,
            mode: Mutex::new(Mode::Healthy),
            prices: prices
                .iter()
                .map(|(symbol, price, prev)| (symbol.to_string(), (*price, *prev)))
                .collect(),
            quote_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            news_calls: AtomicUsize::new(0),
            last_news_limit: AtomicUsize::new(0),
        }
    }

    pub fn brazil(prices: &[(&str, f64, f64)]) -> Arc<Self> {
        Arc::new(Self::new("BR_MOCK", Market::Brazil, prices))
    }

    pub fn us(prices: &[(&str, f64, f64)]) -> Arc<Self> {
        Arc::new(Self::new("US_MOCK", Market::UnitedStates, prices))
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_mode(&self) -> Result<(), MarketDataError> {
        match *self.mode.lock().unwrap() {
            Mode::Healthy => Ok(()),
            Mode::Failing => Err(MarketDataError::Network {
                provider: self.id.to_string(),
                message: "connection reset".to_string(),
            }),
            Mode::Throttled => Err(MarketDataError::RateLimited {
                provider: self.id.to_string(),
            }),
        }
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
                volume: Some(1000.0),
                ..Default::default()
            },
            self.id,
        )
    }

    fn country(&self) -> Country {
        match self.market {
            Market::Brazil => Country::Brazil,
            Market::UnitedStates => Country::UnitedStates,
        }
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn market(&self) -> Market {
        self.market
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.check_mode()?;
        self.quote_for(symbol)
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_mode()?;
        Ok(symbols
            .iter()
            .filter_map(|s| self.quote_for(s).ok())
            .collect())
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check_mode()?;
        if !self.prices.contains_key(symbol) {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        Ok(CompanyProfile::new(symbol, format!("{} Corp", symbol), "MOCK", self.id))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_mode()?;
        let query = query.to_uppercase();
        let mut matches: Vec<SearchResult> = self
            .prices
            .keys()
            .filter(|symbol| symbol.contains(&query))
            .map(|symbol| {
                SearchResult::new(symbol.clone(), format!("{} Corp", symbol), "Stock", "MOCK", self.country())
            })
            .collect();
        matches.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(matches)
    }

    async fn get_news(&self, limit: usize) -> Result<Vec<NewsArticle>, MarketDataError> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        self.last_news_limit.store(limit, Ordering::SeqCst);
        self.check_mode()?;
        Ok((0..limit.min(3))
            .map(|i| NewsArticle {
                id: i as i64,
                headline: format!("Headline {}", i),
                summary: String::new(),
                source: "mock".to_string(),
                url: format!("https://news.example/{}", i),
                published_at: Some(Utc::now()),
                related: Vec::new(),
            })
            .collect())
    }
}

/// Test configuration: no pause between Brazilian batch requests.
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        br_batch_delay: Duration::ZERO,
        ..Default::default()
    }
}

pub fn gateway_with(
    config: GatewayConfig,
    brazil: &Arc<ScriptedProvider>,
    us: &Arc<ScriptedProvider>,
) -> MarketGateway {
    MarketGateway::with_providers(
        config,
        CacheLayer::in_memory(),
        brazil.clone(),
        us.clone(),
    )
    .unwrap()
}

pub fn gateway(brazil: &Arc<ScriptedProvider>, us: &Arc<ScriptedProvider>) -> MarketGateway {
    gateway_with(test_config(), brazil, us)
}

/// Put a quote captured `age` ago into the gateway's cache.
pub async fn seed_quote(gateway: &MarketGateway, symbol: &str, price: f64, age: Duration) -> Quote {
    let mut quote = normalize_quote(
        RawQuote {
            symbol: symbol.to_string(),
            price: Some(price),
            previous_close: Some(price - 1.0),
            ..Default::default()
        },
        "SEED",
    )
    .unwrap();
    quote.timestamp = Utc::now() - chrono::Duration::from_std(age).unwrap();
    gateway
        .cache()
        .set(&CacheKeys::quote(symbol), &quote, CacheTtl::Static)
        .await;
    quote
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
