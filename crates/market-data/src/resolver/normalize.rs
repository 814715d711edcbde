//! Conversion of provider payloads into the canonical quote shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::Quote;

/// Provider fields before normalization. Upstream JSON numbers arrive as
/// `f64` and any of them may be missing.
#[derive(Clone, Debug, Default)]
pub struct RawQuote {
    pub symbol: String,
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub logo: Option<String>,
}

/// Convert an upstream float to `Decimal`, rejecting NaN and infinities.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::try_from(value).ok()
}

/// Absolute and percentage change against the previous close.
///
/// The percentage is zero when the previous close is not positive, and is
/// otherwise rounded to 4 decimal places.
pub fn change_and_percent(price: Decimal, previous_close: Decimal) -> (Decimal, Decimal) {
    let change = price - previous_close;
    if previous_close <= Decimal::ZERO {
        return (change, Decimal::ZERO);
    }
    let percent = change
        .checked_div(previous_close)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|p| p.round_dp(4))
        .unwrap_or(Decimal::ZERO);
    (change, percent)
}

/// Build a canonical [`Quote`] from raw provider fields.
///
/// A missing or non-finite price means the provider had no data for the
/// symbol. Missing session prices fall back to the last price and a missing
/// volume is zero.
pub fn normalize_quote(raw: RawQuote, source: &str) -> Result<Quote, MarketDataError> {
    let price = raw
        .price
        .and_then(to_decimal)
        .ok_or_else(|| MarketDataError::SymbolNotFound(raw.symbol.clone()))?;

    let previous_close = raw
        .previous_close
        .and_then(to_decimal)
        .unwrap_or(Decimal::ZERO);
    let (change, change_percent) = change_and_percent(price, previous_close);

    let or_price = |value: Option<f64>| value.and_then(to_decimal).unwrap_or(price);
    let volume = raw
        .volume
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0);

    Ok(Quote {
        symbol: raw.symbol,
        price,
        change,
        change_percent,
        high: or_price(raw.high),
        low: or_price(raw.low),
        open: or_price(raw.open),
        previous_close,
        volume,
        timestamp: raw.timestamp.unwrap_or_else(Utc::now),
        logo: raw.logo,
        source: source.to_string(),
        is_stale: false,
    })
}
