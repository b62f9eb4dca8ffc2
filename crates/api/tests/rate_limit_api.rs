//! Integration tests for the request rate limiter.
//!
//! All requests here are rejected before any query runs, so a lazy pool is
//! enough.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{body_json, send};

fn from_ip(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test: the 6th auth request in a window is rejected with retryAfter 60
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sixth_auth_request_is_rate_limited() {
    let app: Router = common::build_test_app(common::lazy_pool());

    for _ in 0..5 {
        let response = send(app.clone(), from_ip("/api/v1/auth/session", "203.0.113.10")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = send(app.clone(), from_ip("/api/v1/auth/session", "203.0.113.10")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("retry-after").unwrap(), "60");

    let json = body_json(response).await;
    assert_eq!(json["error"], "Rate limit exceeded");
    assert_eq!(json["retryAfter"], 60);
}

// ---------------------------------------------------------------------------
// Test: counters are per client IP and per path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn limits_are_keyed_by_ip_and_path() {
    let app = common::build_test_app(common::lazy_pool());

    for _ in 0..5 {
        send(app.clone(), from_ip("/api/v1/auth/session", "203.0.113.10")).await;
    }
    let limited = send(app.clone(), from_ip("/api/v1/auth/session", "203.0.113.10")).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_ip = send(app.clone(), from_ip("/api/v1/auth/session", "198.51.100.22")).await;
    assert_eq!(other_ip.status(), StatusCode::UNAUTHORIZED);

    let other_path = send(app.clone(), from_ip("/api/v1/orders", "203.0.113.10")).await;
    assert_eq!(other_path.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Test: payment paths allow 10 requests per window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn payment_paths_allow_ten_per_window() {
    let app = common::build_test_app(common::lazy_pool());

    for _ in 0..10 {
        let response = send(app.clone(), from_ip("/api/v1/billing/portal", "192.0.2.1")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = send(app.clone(), from_ip("/api/v1/billing/portal", "192.0.2.1")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// ---------------------------------------------------------------------------
// Test: other paths allow 100 requests per window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_paths_allow_one_hundred_per_window() {
    let app = common::build_test_app(common::lazy_pool());

    for _ in 0..100 {
        let response = send(app.clone(), from_ip("/api/v1/orders", "192.0.2.2")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = send(app.clone(), from_ip("/api/v1/orders", "192.0.2.2")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
