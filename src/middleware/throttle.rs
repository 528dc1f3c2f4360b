use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::app::AppState;
use crate::error::ApiError;
use crate::throttle::Decision;

/// Per-IP rate limiting. Runs after authentication, so anonymous calls never
/// consume quota.
pub async fn throttle(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(limiter) = state.limiter.clone() else {
        return Ok(next.run(request).await);
    };

    let ip = client_ip(&request, state.config.api.num_proxies);

    match limiter.check_ip(&ip).await {
        Ok(Decision::Allowed { limit, remaining, reset_in_seconds }) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            insert_header(headers, "x-ratelimit-limit", limit);
            insert_header(headers, "x-ratelimit-remaining", remaining);
            insert_header(headers, "x-ratelimit-reset", reset_in_seconds);
            Ok(response)
        }
        Ok(Decision::Throttled { retry_after }) => {
            tracing::warn!("Rate limit exceeded for {} on {}", ip, request.uri().path());
            Err(ApiError::too_many_requests(
                format!("Request was throttled. Expected available in {} seconds.", retry_after),
                Some(retry_after),
            ))
        }
        Err(e) => {
            // Let the request through rather than block legitimate users
            tracing::error!("Rate limiting check failed: {}", e);
            Ok(next.run(request).await)
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: u64) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, value);
    }
}

/// Client address used as the throttle key.
///
/// With `num_proxies == 0` only the socket peer is trusted. Otherwise the
/// address that many hops from the right of `X-Forwarded-For` is used.
pub fn client_ip(request: &Request, num_proxies: usize) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    if num_proxies > 0 {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').map(str::trim).filter(|a| !a.is_empty()).collect::<Vec<_>>());

        if let Some(addrs) = forwarded.filter(|a| !a.is_empty()) {
            let index = addrs.len() - num_proxies.min(addrs.len());
            return addrs[index].to_string();
        }
    }

    peer.unwrap_or_else(|| "unknown".to_string())
}
