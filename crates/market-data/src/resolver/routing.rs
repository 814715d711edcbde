use std::fmt;

use serde::Serialize;

/// Market an identifier is routed to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Market {
    #[serde(rename = "BR")]
    Brazil,
    #[serde(rename = "US")]
    UnitedStates,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brazil => write!(f, "BR"),
            Self::UnitedStates => write!(f, "US"),
        }
    }
}

const MAX_SYMBOL_LEN: usize = 20;

/// Canonical form of a user-supplied identifier: trimmed, uppercase.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Whether a normalized identifier is a plausible ticker: letters, digits and
/// `.^=-` only, with at least one letter or digit.
pub fn is_valid_symbol(symbol: &str) -> bool {
    symbol.len() <= MAX_SYMBOL_LEN
        && symbol.chars().any(|c| c.is_ascii_alphanumeric())
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '=' | '-'))
}

/// Route an identifier by its shape alone.
///
/// Brazilian listings carry a `.SA` suffix or end in a share-class digit
/// (`PETR4`, `VALE3.SA`). Everything else, including crypto pairs such as
/// `BTC-USD`, goes to the US provider. Index tickers like `^BVSP` match
/// neither rule and must be routed explicitly by the caller.
pub fn route_for(symbol: &str) -> Market {
    let symbol = symbol.trim();
    let has_sa_suffix = symbol.len() >= 3
        && symbol
            .get(symbol.len() - 3..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(".SA"));
    let ends_in_digit = symbol.chars().last().is_some_and(|c| c.is_ascii_digit());

    if has_sa_suffix || ends_in_digit {
        Market::Brazil
    } else {
        Market::UnitedStates
    }
}

/// Partition identifiers by market, preserving their relative order.
pub fn split_by_market(symbols: &[String]) -> (Vec<String>, Vec<String>) {
    symbols
        .iter()
        .cloned()
        .partition(|symbol| route_for(symbol) == Market::Brazil)
}
