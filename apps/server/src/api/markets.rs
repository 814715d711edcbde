use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use quotegate_market_data::{
    CompanyProfile, GatewayStatus, HeatmapTile, MarketIndices, NewsArticle, Quote, SearchResult,
    TopMovers, MAX_NEWS_ARTICLES,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

const MAX_BATCH_SYMBOLS: usize = 50;
const MIN_SEARCH_LEN: usize = 2;
const DEFAULT_NEWS_LIMIT: usize = 15;
const MAX_NEWS_LIMIT: usize = MAX_NEWS_ARTICLES;
const DEFAULT_TIMEFRAME: &str = "1d";

#[derive(Deserialize)]
struct QuoteParams {
    symbol: Option<String>,
}

#[derive(Deserialize)]
struct QuotesParams {
    symbols: Option<String>,
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Deserialize)]
struct MoversParams {
    timeframe: Option<String>,
}

#[derive(Deserialize)]
struct NewsParams {
    limit: Option<usize>,
}

/// Search hit with its latest quote when one is available.
#[derive(Serialize)]
struct SearchHit {
    #[serde(flatten)]
    result: SearchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote: Option<Quote>,
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> ApiResult<Json<Quote>> {
    let symbol = params
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'symbol' is required".into()))?;

    state
        .gateway
        .get_quote(symbol)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No quote available for {}", symbol)))
}

async fn get_quotes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuotesParams>,
) -> ApiResult<Json<Vec<Quote>>> {
    let symbols: Vec<String> = params
        .symbols
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ApiError::BadRequest(
            "Query parameter 'symbols' is required".into(),
        ));
    }
    if symbols.len() > MAX_BATCH_SYMBOLS {
        return Err(ApiError::BadRequest(format!(
            "At most {} symbols per request",
            MAX_BATCH_SYMBOLS
        )));
    }

    Ok(Json(state.gateway.get_quotes(&symbols).await))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<CompanyProfile>> {
    state
        .gateway
        .get_company_profile(&symbol)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No profile available for {}", symbol)))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchHit>> {
    let query = params.q.unwrap_or_default();
    let query = query.trim();
    if query.chars().count() < MIN_SEARCH_LEN {
        return Json(Vec::new());
    }

    let results = state.gateway.search_symbols(query).await;
    let symbols: Vec<String> = results.iter().map(|r| r.symbol.clone()).collect();
    let mut quotes = state.gateway.get_quotes(&symbols).await;

    let hits = results
        .into_iter()
        .map(|result| {
            let quote = quotes
                .iter()
                .position(|q| q.symbol.eq_ignore_ascii_case(&result.symbol))
                .map(|i| quotes.swap_remove(i));
            SearchHit { result, quote }
        })
        .collect();
    Json(hits)
}

async fn get_indices(State(state): State<Arc<AppState>>) -> Json<MarketIndices> {
    Json(state.gateway.get_market_indices().await)
}

async fn get_movers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MoversParams>,
) -> Json<TopMovers> {
    let timeframe = params
        .timeframe
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());
    Json(state.gateway.get_top_movers(&timeframe).await)
}

async fn get_heatmap(State(state): State<Arc<AppState>>) -> Json<Vec<HeatmapTile>> {
    Json(state.gateway.get_heatmap().await)
}

async fn get_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewsParams>,
) -> Json<Vec<NewsArticle>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_NEWS_LIMIT)
        .clamp(1, MAX_NEWS_LIMIT);
    Json(state.gateway.get_market_news(limit).await)
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<GatewayStatus> {
    Json(state.gateway.status())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/markets/quote", get(get_quote))
        .route("/markets/quotes", get(get_quotes))
        .route("/markets/profile/{symbol}", get(get_profile))
        .route("/markets/search", get(search))
        .route("/markets/indices", get(get_indices))
        .route("/markets/movers", get(get_movers))
        .route("/markets/heatmap", get(get_heatmap))
        .route("/markets/news", get(get_news))
        .route("/markets/status", get(get_status))
}
