use std::time::Duration;

/// Retention tiers for cached values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheTtl {
    /// 60 seconds: quotes freshness, partial index sets, batch quote lists
    Hot,
    /// 5 minutes: indices, movers, heatmap, news, partial search results
    Warm,
    /// 1 hour: company profiles
    Cold,
    /// 24 hours: complete search results, long-retention quote copies
    Static,
}

impl CacheTtl {
    pub fn duration(self) -> Duration {
        match self {
            Self::Hot => Duration::from_secs(60),
            Self::Warm => Duration::from_secs(300),
            Self::Cold => Duration::from_secs(3600),
            Self::Static => Duration::from_secs(86400),
        }
    }
}

impl From<CacheTtl> for Duration {
    fn from(ttl: CacheTtl) -> Self {
        ttl.duration()
    }
}

/// Cache key naming scheme.
pub struct CacheKeys;

impl CacheKeys {
    pub fn quote(symbol: &str) -> String {
        format!("quote:{}", symbol)
    }

    /// Key for a batch of quotes. The list is sorted and de-duplicated so
    /// that any permutation of the same set maps to one key.
    pub fn quotes(symbols: &[String]) -> String {
        let mut sorted: Vec<&str> = symbols.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        format!("quotes:{}", sorted.join(","))
    }

    pub fn profile(symbol: &str) -> String {
        format!("symbol:info:{}", symbol)
    }

    pub fn search(query: &str) -> String {
        format!("symbol:search:{}", query.trim().to_lowercase())
    }

    pub fn market_indices() -> String {
        "market:indices".to_string()
    }

    pub fn top_movers(timeframe: &str) -> String {
        format!("market:movers:{}", timeframe)
    }

    pub fn top_movers_pattern() -> String {
        "market:movers:*".to_string()
    }

    pub fn heatmap() -> String {
        "market:heatmap".to_string()
    }

    pub fn news() -> String {
        "news:all".to_string()
    }

    pub fn rate_limit(action: &str, identifier: &str) -> String {
        format!("ratelimit:{}:{}", action, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_batch_key_is_order_independent() {
        let a = CacheKeys::quotes(&owned(&["MSFT", "AAPL", "PETR4"]));
        let b = CacheKeys::quotes(&owned(&["PETR4", "MSFT", "AAPL"]));
        assert_eq!(a, b);
        assert_eq!(a, "quotes:AAPL,MSFT,PETR4");
    }

    #[test]
    fn test_batch_key_ignores_duplicates() {
        let a = CacheKeys::quotes(&owned(&["AAPL", "AAPL", "MSFT"]));
        assert_eq!(a, CacheKeys::quotes(&owned(&["MSFT", "AAPL"])));
    }

    #[test]
    fn test_search_key_is_normalized() {
        assert_eq!(CacheKeys::search("  Petro "), "symbol:search:petro");
    }

    #[test]
    fn test_tier_durations() {
        assert_eq!(CacheTtl::Hot.duration(), Duration::from_secs(60));
        assert_eq!(CacheTtl::Warm.duration(), Duration::from_secs(300));
        assert_eq!(CacheTtl::Cold.duration(), Duration::from_secs(3600));
        assert_eq!(CacheTtl::Static.duration(), Duration::from_secs(86400));
    }
}
