use std::sync::Arc;
use std::time::Duration;

use quotegate_market_data::{CacheLayer, MarketGateway, RedisStore};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};

/// Inbound per-client limit applied to `/markets/*`.
#[derive(Clone, Copy, Debug)]
pub struct ClientLimit {
    pub max_requests: u64,
    pub window: Duration,
}

pub struct AppState {
    pub gateway: MarketGateway,
    pub client_limit: ClientLimit,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(gateway: MarketGateway, config: &Config) -> Self {
        Self {
            gateway,
            client_limit: ClientLimit {
                max_requests: config.client_rate_limit,
                window: config.client_rate_window,
            },
            admin_token: config.admin_token.clone(),
        }
    }

    pub fn cache(&self) -> &CacheLayer {
        self.gateway.cache()
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let cache = match &config.redis_url {
        Some(url) => CacheLayer::new(Arc::new(RedisStore::connect(url).await?)),
        None => {
            tracing::warn!("QG_REDIS_URL not set; using an in-process cache store");
            CacheLayer::in_memory()
        }
    };

    if config.brapi_token.is_none() && config.tiingo_api_key.is_none() {
        tracing::warn!("Neither BRAPI_TOKEN nor TIINGO_API_KEY is set; upstream calls are unauthenticated");
    }

    let gateway = MarketGateway::new(config.gateway_config(), cache)?;
    Ok(Arc::new(AppState::new(gateway, config)))
}
