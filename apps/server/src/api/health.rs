use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use quotegate_market_data::ProviderStatus;
use serde::Serialize;

use crate::main_lib::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    status: &'static str,
    cache: &'static str,
    providers: Vec<ProviderStatus>,
    timestamp: DateTime<Utc>,
}

/// Cache ping plus the circuit and budget state of each provider.
/// Answers 503 only when the cache store is unreachable.
async fn get_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let cache_up = state.cache().is_healthy().await;
    let gateway = state.gateway.status();

    let (code, status) = match (cache_up, gateway.all_circuits_closed()) {
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        (true, false) => (StatusCode::OK, "degraded"),
        (true, true) => (StatusCode::OK, "healthy"),
    };

    let report = HealthReport {
        status,
        cache: if cache_up { "up" } else { "down" },
        providers: gateway.providers,
        timestamp: Utc::now(),
    };
    (code, Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}
