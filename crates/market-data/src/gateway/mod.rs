//! Aggregation API over the two upstream providers.
//!
//! Every read follows the same path:
//!
//! ```text
//! cache (fresh?) -> circuit breaker gate -> rate budget -> provider -> normalize -> cache
//! ```
//!
//! Degraded upstreams never surface as errors. A refused or failed call
//! answers with the last cached value (flagged stale) when there is one, and
//! with an absent result otherwise.

mod config;
mod status;
mod universe;

pub use config::{GatewayConfig, DEFAULT_BR_BATCH_DELAY};
pub use status::{BudgetStatus, GatewayStatus, ProviderStatus};

/// Articles fetched and cached per news refresh.
pub const MAX_NEWS_ARTICLES: usize = 50;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKeys, CacheLayer, CacheTtl};
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{
    CompanyProfile, HeatmapTile, MarketIndices, Mover, NewsArticle, ProviderId, Quote,
    SearchResult, TopMovers,
};
use crate::provider::brapi::BrapiProvider;
use crate::provider::tiingo::TiingoProvider;
use crate::provider::MarketDataProvider;
use crate::registry::{CircuitBreaker, RateBudgets};
use crate::resolver::{is_valid_symbol, normalize_symbol, route_for, split_by_market, Market};

/// Market data gateway: caching, fault isolation and quota protection in
/// front of one provider per market.
pub struct MarketGateway {
    cache: CacheLayer,
    brazil: Arc<dyn MarketDataProvider>,
    us: Arc<dyn MarketDataProvider>,
    breaker: CircuitBreaker,
    budgets: RateBudgets,
    config: GatewayConfig,
}

impl MarketGateway {
    /// Build a gateway over the Brapi and Tiingo upstreams.
    pub fn new(config: GatewayConfig, cache: CacheLayer) -> Result<Self, MarketDataError> {
        config.validate()?;
        let brazil = Arc::new(BrapiProvider::new(&config.brapi)?);
        let us = Arc::new(TiingoProvider::new(&config.tiingo)?);
        Self::with_providers(config, cache, brazil, us)
    }

    /// Build a gateway over arbitrary providers.
    ///
    /// The rate budget from `config` is applied to the US provider.
    pub fn with_providers(
        config: GatewayConfig,
        cache: CacheLayer,
        brazil: Arc<dyn MarketDataProvider>,
        us: Arc<dyn MarketDataProvider>,
    ) -> Result<Self, MarketDataError> {
        config.validate()?;

        if brazil.market() != Market::Brazil || us.market() != Market::UnitedStates {
            return Err(MarketDataError::InvalidConfig(format!(
                "provider markets mismatch: '{}' serves {}, '{}' serves {}",
                brazil.id(),
                brazil.market(),
                us.id(),
                us.market()
            )));
        }

        let budgets = RateBudgets::new();
        if let Some(budget) = &config.tiingo_budget {
            budgets.configure(&provider_id(us.as_ref()), budget.clone());
        }

        info!(
            "Market gateway ready (BR: {}, US: {})",
            brazil.id(),
            us.id()
        );

        Ok(Self {
            cache,
            brazil,
            us,
            breaker: CircuitBreaker::with_config(config.circuit_breaker.clone()),
            budgets,
            config,
        })
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    fn provider_for(&self, market: Market) -> &dyn MarketDataProvider {
        match market {
            Market::Brazil => self.brazil.as_ref(),
            Market::UnitedStates => self.us.as_ref(),
        }
    }

    fn providers(&self) -> [&dyn MarketDataProvider; 2] {
        [self.brazil.as_ref(), self.us.as_ref()]
    }

    // ------------------------------------------------------------------
    // Upstream gate
    // ------------------------------------------------------------------

    /// Circuit breaker first, then the provider's rate budget.
    fn admit(&self, provider: &dyn MarketDataProvider) -> Result<(), MarketDataError> {
        let id = provider_id(provider);
        if !self.breaker.is_allowed(&id) {
            return Err(MarketDataError::CircuitOpen {
                provider: id.to_string(),
            });
        }
        if !self.budgets.try_consume(&id) {
            return Err(MarketDataError::BudgetExhausted {
                provider: id.to_string(),
            });
        }
        Ok(())
    }

    /// Feed a provider outcome back into the breaker and budget.
    fn settle<T>(
        &self,
        provider: &dyn MarketDataProvider,
        result: Result<T, MarketDataError>,
    ) -> Result<T, RetryClass> {
        let id = provider_id(provider);
        match result {
            Ok(value) => {
                self.breaker.record_success(&id);
                Ok(value)
            }
            Err(err) => {
                let class = err.retry_class();
                match class {
                    RetryClass::Transient => {
                        warn!("{} call failed: {}", id, err);
                        self.breaker.record_failure(&id);
                    }
                    RetryClass::QuotaExceeded => {
                        warn!("{} throttled the gateway: {}", id, err);
                        self.budgets.block_for_window(&id);
                    }
                    RetryClass::Absent | RetryClass::Skipped => {
                        debug!("{}: {}", id, err);
                    }
                    RetryClass::Fatal => {
                        error!("{}: {}", id, err);
                    }
                }
                Err(class)
            }
        }
    }

    /// Run one gated provider call.
    async fn call<'a, T, F, Fut>(
        &self,
        provider: &'a dyn MarketDataProvider,
        op: F,
    ) -> Result<T, RetryClass>
    where
        F: FnOnce(&'a dyn MarketDataProvider) -> Fut,
        Fut: std::future::Future<Output = Result<T, MarketDataError>>,
    {
        if let Err(refused) = self.admit(provider) {
            debug!("Skipping upstream call: {}", refused);
            return Err(refused.retry_class());
        }
        let result = op(provider).await;
        self.settle(provider, result)
    }

    fn is_fresh(&self, quote: &Quote) -> bool {
        let fresh_for = ChronoDuration::from_std(self.config.quote_fresh_for)
            .unwrap_or_else(|_| ChronoDuration::seconds(60));
        quote.is_fresh_at(Utc::now(), fresh_for)
    }

    /// Store a quote for stale fallback. Freshness is judged by its
    /// timestamp, so it is kept far longer than it is served as fresh.
    async fn store_quote(&self, quote: &Quote) {
        self.cache
            .set(&CacheKeys::quote(&quote.symbol), quote, CacheTtl::Static)
            .await;
    }

    // ------------------------------------------------------------------
    // Quotes
    // ------------------------------------------------------------------

    /// Latest quote for a symbol, routed by its shape.
    ///
    /// Returns the stale cached quote when the upstream is gated or failing,
    /// and `None` when the symbol is unknown or nothing is cached.
    pub async fn get_quote(&self, symbol: &str) -> Option<Quote> {
        let symbol = normalize_symbol(symbol);
        if !is_valid_symbol(&symbol) {
            return None;
        }
        self.quote_via(route_for(&symbol), &symbol).await
    }

    async fn quote_via(&self, market: Market, symbol: &str) -> Option<Quote> {
        let cached: Option<Quote> = self.cache.get(&CacheKeys::quote(symbol)).await;
        if let Some(quote) = &cached {
            if self.is_fresh(quote) {
                debug!("Cache hit for {}", symbol);
                return cached;
            }
        }

        let provider = self.provider_for(market);
        match self.call(provider, |p| p.get_quote(symbol)).await {
            Ok(mut quote) => {
                quote.symbol = symbol.to_string();
                self.store_quote(&quote).await;
                Some(quote)
            }
            Err(RetryClass::Absent) => None,
            Err(_) => {
                if cached.is_some() {
                    debug!("Serving stale quote for {}", symbol);
                }
                cached.map(Quote::into_stale)
            }
        }
    }

    /// Quotes for many symbols, in input order, duplicates removed.
    ///
    /// Symbols that could not be resolved are omitted. Never fails.
    pub async fn get_quotes(&self, symbols: &[String]) -> Vec<Quote> {
        let mut seen = HashSet::new();
        let requested: Vec<String> = symbols
            .iter()
            .map(|s| normalize_symbol(s))
            .filter(|s| is_valid_symbol(s) && seen.insert(s.clone()))
            .collect();
        if requested.is_empty() {
            return Vec::new();
        }

        let batch_key = CacheKeys::quotes(&requested);
        if let Some(batch) = self.cache.get::<Vec<Quote>>(&batch_key).await {
            debug!("Batch cache hit for {} symbols", requested.len());
            return in_request_order(&requested, batch);
        }

        let keys: Vec<String> = requested.iter().map(|s| CacheKeys::quote(s)).collect();
        let cached: Vec<Option<Quote>> = self.cache.get_many(&keys).await;

        let mut found: HashMap<String, Quote> = HashMap::new();
        let mut stale: HashMap<String, Quote> = HashMap::new();
        let mut misses: Vec<String> = Vec::new();

        for (symbol, quote) in requested.iter().zip(cached) {
            match quote {
                Some(quote) if self.is_fresh(&quote) => {
                    found.insert(symbol.clone(), quote);
                }
                Some(quote) => {
                    stale.insert(symbol.clone(), quote);
                    misses.push(symbol.clone());
                }
                None => misses.push(symbol.clone()),
            }
        }

        let (br_misses, us_misses) = split_by_market(&misses);
        let (br_quotes, us_quotes) = tokio::join!(
            self.fetch_brazil_batch(&br_misses),
            self.fetch_us_batch(&us_misses)
        );

        for quote in br_quotes.into_iter().chain(us_quotes) {
            self.store_quote(&quote).await;
            found.insert(quote.symbol.clone(), quote);
        }

        let mut served_stale = false;
        for symbol in &misses {
            if found.contains_key(symbol) {
                continue;
            }
            if let Some(quote) = stale.remove(symbol) {
                served_stale = true;
                found.insert(symbol.clone(), quote.into_stale());
            }
        }

        let quotes: Vec<Quote> = requested
            .iter()
            .filter_map(|symbol| found.remove(symbol))
            .collect();

        if quotes.len() == requested.len() && !served_stale {
            self.cache.set(&batch_key, &quotes, CacheTtl::Hot).await;
        }
        quotes
    }

    /// Brazilian misses: one gated request per symbol, spaced out.
    async fn fetch_brazil_batch(&self, symbols: &[String]) -> Vec<Quote> {
        if symbols.is_empty() {
            return Vec::new();
        }
        debug!("Fetching {} BR symbols", symbols.len());

        let mut quotes = Vec::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.config.br_batch_delay.is_zero() {
                tokio::time::sleep(self.config.br_batch_delay).await;
            }
            if let Ok(mut quote) = self
                .call(self.brazil.as_ref(), |p| p.get_quote(symbol))
                .await
            {
                quote.symbol = symbol.clone();
                quotes.push(quote);
            }
        }
        quotes
    }

    /// US misses: one batched request behind a single budget check.
    async fn fetch_us_batch(&self, symbols: &[String]) -> Vec<Quote> {
        if symbols.is_empty() {
            return Vec::new();
        }
        debug!("Fetching {} US symbols in one batch", symbols.len());

        match self.call(self.us.as_ref(), |p| p.get_quotes(symbols)).await {
            Ok(quotes) => quotes
                .into_iter()
                .filter(|q| symbols.contains(&q.symbol))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Profiles and search
    // ------------------------------------------------------------------

    /// Company profile, cached at the cold tier.
    ///
    /// No stale fallback: a gated or failing upstream answers `None`.
    pub async fn get_company_profile(&self, symbol: &str) -> Option<CompanyProfile> {
        let symbol = normalize_symbol(symbol);
        if !is_valid_symbol(&symbol) {
            return None;
        }
        let provider = self.provider_for(route_for(&symbol));

        self.cache
            .get_or_fetch(&CacheKeys::profile(&symbol), CacheTtl::Cold, || async {
                self.call(provider, |p| p.get_profile(&symbol)).await.ok()
            })
            .await
    }

    /// Search both markets concurrently and merge the answers, Brazilian
    /// listings first, one entry per symbol.
    pub async fn search_symbols(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let key = CacheKeys::search(query);
        if let Some(cached) = self.cache.get::<Vec<SearchResult>>(&key).await {
            return cached;
        }

        let (br, us) = tokio::join!(
            self.search_with(self.brazil.as_ref(), query),
            self.search_with(self.us.as_ref(), query)
        );
        let answered = usize::from(br.is_some()) + usize::from(us.is_some());

        let mut seen = HashSet::new();
        let results: Vec<SearchResult> = br
            .into_iter()
            .flatten()
            .chain(us.into_iter().flatten())
            .filter(|result| seen.insert(result.symbol.clone()))
            .collect();

        match answered {
            2 => self.cache.set(&key, &results, CacheTtl::Static).await,
            1 => self.cache.set(&key, &results, CacheTtl::Warm).await,
            _ => warn!("Symbol search for '{}' got no upstream answer", query),
        }
        results
    }

    /// `None` when the provider was gated or failed; an empty list when it
    /// answered with no matches.
    async fn search_with(
        &self,
        provider: &dyn MarketDataProvider,
        query: &str,
    ) -> Option<Vec<SearchResult>> {
        match self.call(provider, |p| p.search(query)).await {
            Ok(results) => Some(results),
            Err(RetryClass::Absent) => Some(Vec::new()),
            Err(_) => None,
        }
    }

    // ------------------------------------------------------------------
    // Composite market views
    // ------------------------------------------------------------------

    /// Benchmark indices. Ibovespa always goes to the Brazilian provider;
    /// the US benchmarks are quoted through their ETF proxies.
    pub async fn get_market_indices(&self) -> MarketIndices {
        let key = CacheKeys::market_indices();
        if let Some(cached) = self.cache.get::<MarketIndices>(&key).await {
            return cached;
        }

        let proxies = universe::owned(&[
            universe::SP500_PROXY,
            universe::NASDAQ_PROXY,
            universe::DOW_PROXY,
        ]);
        let (ibovespa, us_quotes) = tokio::join!(
            self.quote_via(Market::Brazil, universe::IBOVESPA),
            self.get_quotes(&proxies)
        );

        let pick = |symbol: &str| us_quotes.iter().find(|q| q.symbol == symbol).cloned();
        let indices = MarketIndices {
            ibovespa,
            sp500: pick(universe::SP500_PROXY),
            nasdaq: pick(universe::NASDAQ_PROXY),
            dow: pick(universe::DOW_PROXY),
        };

        if indices.is_complete() {
            self.cache.set(&key, &indices, CacheTtl::Warm).await;
        } else if !indices.is_empty() {
            self.cache.set(&key, &indices, CacheTtl::Hot).await;
        } else {
            warn!("No index quotes available");
        }
        indices
    }

    /// Top gainers and losers of the fixed movers universe.
    ///
    /// Entries without a price or without movement are ignored.
    pub async fn get_top_movers(&self, timeframe: &str) -> TopMovers {
        let key = CacheKeys::top_movers(timeframe);
        if let Some(cached) = self.cache.get::<TopMovers>(&key).await {
            return cached;
        }

        let quotes = self.get_quotes(&universe::owned(universe::MOVERS)).await;
        let mut ranked: Vec<&Quote> = quotes
            .iter()
            .filter(|q| q.price > Decimal::ZERO && !q.change_percent.is_zero())
            .collect();
        ranked.sort_by(|a, b| b.change_percent.cmp(&a.change_percent));

        let movers = TopMovers {
            gainers: ranked
                .iter()
                .filter(|q| q.change_percent > Decimal::ZERO)
                .take(universe::MOVERS_PER_SIDE)
                .map(|q| Mover::from(*q))
                .collect(),
            losers: ranked
                .iter()
                .rev()
                .filter(|q| q.change_percent < Decimal::ZERO)
                .take(universe::MOVERS_PER_SIDE)
                .map(|q| Mover::from(*q))
                .collect(),
        };

        if !ranked.is_empty() {
            self.cache.set(&key, &movers, CacheTtl::Warm).await;
        }
        movers
    }

    /// Sector heatmap over the fixed heatmap universe.
    pub async fn get_heatmap(&self) -> Vec<HeatmapTile> {
        let key = CacheKeys::heatmap();
        if let Some(cached) = self.cache.get::<Vec<HeatmapTile>>(&key).await {
            return cached;
        }

        let quotes = self.get_quotes(&universe::heatmap_symbols()).await;
        let tiles: Vec<HeatmapTile> = quotes
            .iter()
            .filter(|q| q.price > Decimal::ZERO)
            .filter_map(|q| universe::sector_of(&q.symbol).map(|sector| HeatmapTile::new(q, sector)))
            .collect();

        if !tiles.is_empty() {
            self.cache.set(&key, &tiles, CacheTtl::Warm).await;
        }
        tiles
    }

    /// Latest market news from the US provider, at most `limit` articles.
    /// Empty on any failure.
    ///
    /// The upstream is always asked for [`MAX_NEWS_ARTICLES`] so the one
    /// cached list can answer any smaller limit.
    pub async fn get_market_news(&self, limit: usize) -> Vec<NewsArticle> {
        let key = CacheKeys::news();
        let mut news = match self.cache.get::<Vec<NewsArticle>>(&key).await {
            Some(cached) => cached,
            None => match self
                .call(self.us.as_ref(), |p| p.get_news(MAX_NEWS_ARTICLES))
                .await
            {
                Ok(news) => {
                    if !news.is_empty() {
                        self.cache.set(&key, &news, CacheTtl::Warm).await;
                    }
                    news
                }
                Err(_) => Vec::new(),
            },
        };
        news.truncate(limit);
        news
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Circuit and budget state of every provider.
    pub fn status(&self) -> GatewayStatus {
        let providers = self
            .providers()
            .iter()
            .map(|provider| {
                let id = provider_id(*provider);
                ProviderStatus {
                    id: provider.id().to_string(),
                    market: provider.market(),
                    circuit: self.breaker.state(&id),
                    failure_count: self.breaker.failure_count(&id),
                    budget: self.budgets.snapshot(&id).map(BudgetStatus::from),
                }
            })
            .collect();
        GatewayStatus { providers }
    }

    fn known_provider(&self, provider: &str) -> Option<ProviderId> {
        self.providers()
            .iter()
            .find(|p| p.id().eq_ignore_ascii_case(provider))
            .map(|p| provider_id(*p))
    }

    /// Clear a provider's rate budget. Returns false for unknown providers.
    pub fn reset_rate_budget(&self, provider: &str) -> bool {
        match self.known_provider(provider) {
            Some(id) => {
                self.budgets.reset(&id);
                true
            }
            None => false,
        }
    }

    /// Force a provider's circuit closed. Returns false for unknown providers.
    pub fn reset_circuit(&self, provider: &str) -> bool {
        match self.known_provider(provider) {
            Some(id) => {
                self.breaker.reset(&id);
                true
            }
            None => false,
        }
    }

    pub fn reset_all_circuits(&self) {
        self.breaker.reset_all();
    }

    pub async fn invalidate_symbol(&self, symbol: &str) {
        let symbol = normalize_symbol(symbol);
        if is_valid_symbol(&symbol) {
            self.cache.invalidate_symbol(&symbol).await;
        }
    }

    pub async fn invalidate_market(&self) {
        self.cache.invalidate_market().await;
    }
}

fn provider_id(provider: &dyn MarketDataProvider) -> ProviderId {
    Cow::Borrowed(provider.id())
}

fn in_request_order(requested: &[String], quotes: Vec<Quote>) -> Vec<Quote> {
    let mut by_symbol: HashMap<String, Quote> = quotes
        .into_iter()
        .map(|q| (q.symbol.clone(), q))
        .collect();
    requested
        .iter()
        .filter_map(|symbol| by_symbol.remove(symbol))
        .collect()
}
