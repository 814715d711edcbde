use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
struct ResetParams {
    provider: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetResponse {
    reset: Vec<String>,
}

/// Clear rate budgets and close circuits: one provider, or all of them.
async fn reset_rate_limits(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResetParams>,
) -> ApiResult<Json<ResetResponse>> {
    let gateway = &state.gateway;

    let reset = match params.provider.as_deref().map(str::trim) {
        Some(provider) if !provider.is_empty() => {
            if !gateway.reset_rate_budget(provider) {
                return Err(ApiError::NotFound(format!("Unknown provider '{}'", provider)));
            }
            gateway.reset_circuit(provider);
            vec![provider.to_uppercase()]
        }
        _ => {
            let ids: Vec<String> = gateway.status().providers.into_iter().map(|p| p.id).collect();
            for id in &ids {
                gateway.reset_rate_budget(id);
            }
            gateway.reset_all_circuits();
            ids
        }
    };

    tracing::info!("Admin reset of rate budgets and circuits: {:?}", reset);
    Ok(Json(ResetResponse { reset }))
}

#[derive(Deserialize)]
struct InvalidateParams {
    symbol: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvalidateResponse {
    scope: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
}

/// Drop cached entries for one symbol, or the market-wide views.
async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InvalidateParams>,
) -> Json<InvalidateResponse> {
    match params.symbol.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()) {
        Some(symbol) => {
            state.gateway.invalidate_symbol(&symbol).await;
            tracing::info!("Invalidated cached data for {}", symbol);
            Json(InvalidateResponse {
                scope: "symbol",
                symbol: Some(symbol),
            })
        }
        None => {
            state.gateway.invalidate_market().await;
            tracing::info!("Invalidated cached market views");
            Json(InvalidateResponse {
                scope: "market",
                symbol: None,
            })
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/rate-limit/reset", post(reset_rate_limits))
        .route("/admin/cache/invalidate", post(invalidate_cache))
}
