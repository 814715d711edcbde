//! Market data provider trait definitions.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{CompanyProfile, NewsArticle, Quote, SearchResult};
use crate::resolver::Market;

/// Trait for upstream market data providers.
///
/// Providers only translate HTTP payloads into canonical models. Caching,
/// circuit breaking and rate budgets are applied by the gateway around every
/// call, so implementations stay stateless.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider (e.g. "BRAPI", "TIINGO").
    ///
    /// Used for logging, circuit breaker tracking and rate budgets.
    fn id(&self) -> &'static str;

    /// Market this provider serves.
    fn market(&self) -> Market;

    /// Fetch the latest quote for a canonical symbol.
    ///
    /// Returns [`MarketDataError::SymbolNotFound`] when the upstream has no
    /// data for the symbol.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch quotes for several symbols.
    ///
    /// Symbols the upstream does not know are left out of the result. The
    /// default implementation issues one request per symbol.
    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.get_quote(symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(MarketDataError::SymbolNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(quotes)
    }

    /// Fetch company profile information.
    ///
    /// Default implementation returns `NotSupported`.
    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        let _ = symbol;
        Err(MarketDataError::NotSupported {
            operation: "profile".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Search for symbols matching the query.
    ///
    /// Default implementation returns `NotSupported`.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let _ = query;
        Err(MarketDataError::NotSupported {
            operation: "search".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Fetch the latest market news.
    ///
    /// Default implementation returns `NotSupported`.
    async fn get_news(&self, limit: usize) -> Result<Vec<NewsArticle>, MarketDataError> {
        let _ = limit;
        Err(MarketDataError::NotSupported {
            operation: "news".to_string(),
            provider: self.id().to_string(),
        })
    }
}
