//! Fixed symbol sets behind the composite market views.

/// Ibovespa index ticker, served by the Brazilian provider.
pub const IBOVESPA: &str = "^BVSP";

/// ETF proxies for the US benchmark indices.
pub const SP500_PROXY: &str = "SPY";
pub const NASDAQ_PROXY: &str = "QQQ";
pub const DOW_PROXY: &str = "DIA";

/// Mixed US/BR universe ranked for top movers.
pub const MOVERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "META", "JPM", "BAC", "WMT", "HD", "DIS",
    "NFLX", "AMD", "INTC", "COIN", "MARA", "PLTR", "SOFI", "RIVN", "PETR4.SA", "VALE3.SA",
    "ITUB4.SA", "BBDC4.SA", "ABEV3.SA", "WEGE3.SA", "MGLU3.SA", "RENT3.SA", "B3SA3.SA",
    "EGIE3.SA",
];

/// Heatmap universe grouped by sector.
pub const HEATMAP: &[(&str, &[&str])] = &[
    ("Technology", &["AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA"]),
    ("Automotive", &["TSLA"]),
    ("Finance", &["JPM", "BAC", "GS", "WFC", "C", "ITUB4.SA", "BBDC4.SA", "B3SA3.SA"]),
    ("Consumer", &["WMT", "HD", "MCD", "NKE", "SBUX", "ABEV3.SA", "MGLU3.SA", "RENT3.SA"]),
    ("Healthcare", &["JNJ", "UNH", "PFE", "ABBV"]),
    ("Energy & Materials", &["PETR4.SA", "VALE3.SA"]),
    ("Industrial", &["WEGE3.SA"]),
];

/// Number of entries in each movers list.
pub const MOVERS_PER_SIDE: usize = 5;

pub fn owned(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

pub fn heatmap_symbols() -> Vec<String> {
    HEATMAP
        .iter()
        .flat_map(|(_, symbols)| symbols.iter().map(|s| s.to_string()))
        .collect()
}

/// Sector of a heatmap symbol.
pub fn sector_of(symbol: &str) -> Option<&'static str> {
    HEATMAP
        .iter()
        .find(|(_, symbols)| symbols.contains(&symbol))
        .map(|(sector, _)| *sector)
}
