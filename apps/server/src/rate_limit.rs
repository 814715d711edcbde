use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, main_lib::AppState};

const ACTION: &str = "api";
const ANONYMOUS: &str = "anonymous";

/// Client identity for inbound limiting: first `x-forwarded-for` hop.
pub fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

/// Fixed-window limiter in front of `/markets/*`, counted in the cache store.
pub async fn limit_clients(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let limit = state.client_limit;
    let client = client_id(request.headers());

    if state
        .cache()
        .is_rate_limited(&client, ACTION, limit.max_requests, limit.window)
        .await
    {
        tracing::debug!("Client '{}' is over its request limit", client);
        return Err(ApiError::TooManyRequests {
            limit: limit.max_requests,
            retry_after: limit.window,
        });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_id_uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_id(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_id_defaults_to_anonymous() {
        assert_eq!(client_id(&HeaderMap::new()), "anonymous");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        assert_eq!(client_id(&headers), "anonymous");
    }
}
