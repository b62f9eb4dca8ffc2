//! Shared helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use mailroom_api::auth::jwt::{generate_session_token, JwtConfig};
use mailroom_api::billing::stripe::StripeConfig;
use mailroom_api::billing::{BillingError, CheckoutSession, PaymentGateway, PortalSession};
use mailroom_api::config::ServerConfig;
use mailroom_api::context::RequestContext;
use mailroom_api::router::build_app_router;
use mailroom_api::state::AppState;
use mailroom_core::checkout::{CheckoutPolicy, CheckoutSessionRequest};
use mailroom_core::rate_limit::RateLimiter;
use mailroom_core::roles::{ROLE_ADMIN, ROLE_USER};
use mailroom_core::types::DbId;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_APP_BASE_URL: &str = "http://localhost:5173";

/// Build a test `ServerConfig` with safe defaults.
///
/// Order simulation is enabled; the payment processor is never contacted
/// because tests install a [`FakeGateway`].
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        app_base_url: TEST_APP_BASE_URL.to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            session_expiry_mins: 60,
        },
        stripe: StripeConfig {
            secret_key: String::new(),
            webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
        },
        checkout: CheckoutPolicy::default(),
        rate_limit_capacity: 1_000,
        allow_order_simulation: true,
    }
}

/// In-memory [`PaymentGateway`] that records every request.
#[derive(Default)]
pub struct FakeGateway {
    pub checkout_requests: Mutex<Vec<CheckoutSessionRequest>>,
    pub portal_requests: Mutex<Vec<(String, String)>>,
    /// When set, every call fails with this processor message.
    pub fail_with: Option<String>,
}

impl FakeGateway {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn checkout_calls(&self) -> usize {
        self.checkout_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        _ctx: &RequestContext,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, BillingError> {
        self.checkout_requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.fail_with {
            return Err(BillingError::Api {
                status: 402,
                message: message.clone(),
            });
        }
        let n = self.checkout_calls();
        Ok(CheckoutSession {
            id: format!("cs_test_fake_{n}"),
            url: format!("https://checkout.example/pay/cs_test_fake_{n}"),
        })
    }

    async fn create_portal_session(
        &self,
        _ctx: &RequestContext,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        self.portal_requests
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        if let Some(message) = &self.fail_with {
            return Err(BillingError::Api {
                status: 400,
                message: message.clone(),
            });
        }
        Ok(PortalSession {
            url: format!("https://billing.example/session/{customer_id}"),
        })
    }
}

/// Build the full application router around `pool` with a fresh
/// [`FakeGateway`].
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config(), Arc::new(FakeGateway::default()))
}

/// Build the full application router with an explicit config and gateway.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app_with(
    pool: PgPool,
    config: ServerConfig,
    gateway: Arc<dyn PaymentGateway>,
) -> Router {
    let state = AppState {
        pool,
        rate_limiter: Arc::new(RateLimiter::with_capacity(config.rate_limit_capacity)),
        config: Arc::new(config.clone()),
        gateway,
    };
    build_app_router(state, &config)
}

/// A pool that never connects, for requests rejected before any query.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap()
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub fn user_token(user_id: DbId) -> String {
    generate_session_token(user_id, ROLE_USER, &test_config().jwt).unwrap()
}

pub fn admin_token(user_id: DbId) -> String {
    generate_session_token(user_id, ROLE_ADMIN, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, &body, None)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, json_request(Method::POST, uri, &body, Some(token))).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, json_request(Method::PATCH, uri, &body, Some(token))).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
