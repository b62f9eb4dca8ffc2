//! Stripe REST client for checkout and billing-portal sessions.
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token. Every call is bounded by the remaining time of the request
//! that triggered it.

use async_trait::async_trait;
use mailroom_core::checkout::CheckoutSessionRequest;
use serde::Deserialize;

use super::{BillingError, CheckoutSession, PaymentGateway, PortalSession};
use crate::context::RequestContext;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe credentials and endpoint.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`). Empty disables outbound calls.
    pub secret_key: String,
    /// Webhook endpoint signing secret (`whsec_...`). Empty rejects every
    /// webhook.
    pub webhook_secret: String,
    /// API origin, overridable for test doubles.
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &redact(&self.secret_key))
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl StripeConfig {
    /// Load Stripe configuration from environment variables.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `STRIPE_SECRET_KEY`     | (empty)                  |
    /// | `STRIPE_WEBHOOK_SECRET` | (empty)                  |
    /// | `STRIPE_API_BASE`       | `https://api.stripe.com` |
    pub fn from_env() -> Self {
        Self {
            secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        }
    }
}

/// [`PaymentGateway`] backed by the Stripe API.
pub struct StripeGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortalResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Form fields for `POST /v1/checkout/sessions`.
    fn checkout_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("customer_creation".to_string(), "always".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.line_item_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.unit_price_cents.to_string(),
            ),
            (
                "line_items[0][quantity]".to_string(),
                request.quantity.to_string(),
            ),
        ];
        form.extend(
            request
                .metadata
                .iter()
                .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
        );
        form
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, BillingError> {
        if self.config.secret_key.is_empty() {
            return Err(BillingError::NotConfigured);
        }
        let remaining = ctx.remaining();
        if remaining.is_zero() {
            return Err(BillingError::DeadlineExceeded);
        }

        let response = self
            .client
            .post(format!("{}{path}", self.config.api_base.trim_end_matches('/')))
            .bearer_auth(&self.config.secret_key)
            .timeout(remaining)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {e}>"));
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BillingError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        ctx: &RequestContext,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let form = Self::checkout_form(request);
        let session: SessionResponse = self.post_form(ctx, "/v1/checkout/sessions", &form).await?;
        let url = session
            .url
            .ok_or_else(|| BillingError::InvalidResponse("checkout session has no url".into()))?;

        tracing::info!(
            request_id = %ctx.request_id,
            session_id = %session.id,
            quantity = request.quantity,
            "Checkout session created"
        );
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        ctx: &RequestContext,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        let form = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        let portal: PortalResponse = self
            .post_form(ctx, "/v1/billing_portal/sessions", &form)
            .await?;
        Ok(PortalSession { url: portal.url })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    fn request() -> CheckoutSessionRequest {
        let mut metadata = BTreeMap::new();
        metadata.insert("quantity".to_string(), "3".to_string());
        metadata.insert("workspaceName".to_string(), "Acme".to_string());
        CheckoutSessionRequest {
            quantity: 3,
            customer_email: "jane@acme.io".to_string(),
            unit_price_cents: 300,
            total_cents: 900,
            currency: "usd".to_string(),
            line_item_name: "Email Inbox".to_string(),
            success_url: "https://app/onboarding?session_id={CHECKOUT_SESSION_ID}".to_string(),
            cancel_url: "https://app/checkout?canceled=true".to_string(),
            metadata,
        }
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn checkout_form_carries_price_and_metadata() {
        let form = StripeGateway::checkout_form(&request());
        assert_eq!(field(&form, "mode"), Some("payment"));
        assert_eq!(field(&form, "line_items[0][quantity]"), Some("3"));
        assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), Some("300"));
        assert_eq!(field(&form, "metadata[quantity]"), Some("3"));
        assert_eq!(field(&form, "metadata[workspaceName]"), Some("Acme"));
        assert_eq!(
            field(&form, "success_url"),
            Some("https://app/onboarding?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let gateway = StripeGateway::new(StripeConfig {
            secret_key: String::new(),
            webhook_secret: String::new(),
            api_base: "http://127.0.0.1:9".to_string(),
        });
        let ctx = RequestContext::new("req", Duration::from_secs(5));
        assert_matches!(
            gateway.create_checkout_session(&ctx, &request()).await,
            Err(BillingError::NotConfigured)
        );
    }

    #[tokio::test]
    async fn expired_deadline_fails_without_a_request() {
        let gateway = StripeGateway::new(StripeConfig {
            secret_key: "sk_test_123".to_string(),
            webhook_secret: String::new(),
            api_base: "http://127.0.0.1:9".to_string(),
        });
        let ctx = RequestContext::new("req", Duration::ZERO);
        assert_matches!(
            gateway.create_checkout_session(&ctx, &request()).await,
            Err(BillingError::DeadlineExceeded)
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = StripeConfig {
            secret_key: "sk_live_secret".to_string(),
            webhook_secret: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk_live_secret"));
        assert!(debug.contains("<unset>"));
    }
}
