//! Per-instance request rate limiting.
//!
//! Counters live in the [`RateLimiter`](mailroom_core::rate_limit::RateLimiter)
//! held by [`AppState`]; this layer only derives the key and turns a
//! rejection into a 429.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use mailroom_core::error::CoreError;
use mailroom_core::rate_limit::RateDecision;

use crate::error::AppError;
use crate::state::AppState;

const HEADER_X_FORWARDED_FOR: &str = "x-forwarded-for";
const HEADER_X_REAL_IP: &str = "x-real-ip";

/// Count the request against its `(client IP, path)` window.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = client_ip(request.headers(), peer);
    let path = request.uri().path().to_string();

    match state.rate_limiter.check(&client_ip, &path, Instant::now()) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client_ip = %client_ip, path = %path, "Rate limit exceeded");
            AppError::Core(CoreError::RateLimited {
                retry_after_secs: retry_after.as_secs(),
            })
            .into_response()
        }
    }
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header(HEADER_X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(ip) = header(HEADER_X_REAL_IP) {
        return ip.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
