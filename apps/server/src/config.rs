use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use quotegate_market_data::{
    provider::{brapi, tiingo},
    GatewayConfig, ProviderConfig, RateBudgetConfig,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Unset means a process-local cache store
    pub redis_url: Option<String>,
    pub brapi_token: Option<String>,
    pub tiingo_api_key: Option<String>,
    pub brapi_base_url: String,
    pub tiingo_base_url: String,
    pub tiingo_max_per_hour: u32,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Inbound requests allowed per client and window on `/markets/*`
    pub client_rate_limit: u64,
    pub client_rate_window: Duration,
    /// Bearer token guarding `/admin/*`. Open when unset.
    pub admin_token: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            redis_url: None,
            brapi_token: None,
            tiingo_api_key: None,
            brapi_base_url: brapi::BASE_URL.to_string(),
            tiingo_base_url: tiingo::BASE_URL.to_string(),
            tiingo_max_per_hour: 50,
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            client_rate_limit: 100,
            client_rate_window: Duration::from_secs(60),
            admin_token: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let listen_addr = parse_or(&var, "QG_LISTEN_ADDR", defaults.listen_addr)?;
        let cors_allow = match var("QG_CORS_ALLOW_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_allow,
        };
        let timeout_ms: u64 = parse_or(&var, "QG_REQUEST_TIMEOUT_MS", 30_000)?;
        let window_secs: u64 = parse_or(&var, "QG_CLIENT_RATE_WINDOW_SECS", 60)?;

        let tiingo_max_per_hour: u32 =
            parse_or(&var, "QG_TIINGO_MAX_PER_HOUR", defaults.tiingo_max_per_hour)?;
        if tiingo_max_per_hour == 0 {
            return Err(anyhow!("QG_TIINGO_MAX_PER_HOUR must be greater than zero"));
        }
        if window_secs == 0 {
            return Err(anyhow!("QG_CLIENT_RATE_WINDOW_SECS must be greater than zero"));
        }

        Ok(Self {
            listen_addr,
            redis_url: var("QG_REDIS_URL"),
            brapi_token: var("BRAPI_TOKEN"),
            tiingo_api_key: var("TIINGO_API_KEY"),
            brapi_base_url: var("QG_BRAPI_BASE_URL").unwrap_or(defaults.brapi_base_url),
            tiingo_base_url: var("QG_TIINGO_BASE_URL").unwrap_or(defaults.tiingo_base_url),
            tiingo_max_per_hour,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            client_rate_limit: parse_or(&var, "QG_CLIENT_RATE_LIMIT", defaults.client_rate_limit)?,
            client_rate_window: Duration::from_secs(window_secs),
            admin_token: var("QG_ADMIN_TOKEN"),
            log_format: parse_or(&var, "QG_LOG_FORMAT", defaults.log_format)?,
        })
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            brapi: ProviderConfig::new(self.brapi_base_url.clone())
                .with_api_key(self.brapi_token.clone()),
            tiingo: ProviderConfig::new(self.tiingo_base_url.clone())
                .with_api_key(self.tiingo_api_key.clone()),
            tiingo_budget: Some(RateBudgetConfig::per_hour(self.tiingo_max_per_hour)),
            ..GatewayConfig::default()
        }
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
