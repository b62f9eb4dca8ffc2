//! Payment processor integration.
//!
//! - [`PaymentGateway`] -- the outbound seam (checkout and billing-portal
//!   sessions). Handlers only see this trait, so tests swap in a fake.
//! - [`stripe`] -- the Stripe implementation over its REST API.
//! - [`webhook`] -- inbound event signature verification and parsing.

pub mod stripe;
pub mod webhook;

use async_trait::async_trait;
use mailroom_core::checkout::CheckoutSessionRequest;

use crate::context::RequestContext;

/// A hosted checkout page opened with the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// A hosted billing-portal page for an existing customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSession {
    pub url: String,
}

/// Errors from the payment processor layer.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// No API key is configured.
    #[error("Payment processor is not configured")]
    NotConfigured,

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The processor returned a non-2xx status code.
    #[error("Payment processor error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The processor answered 2xx with a body we cannot use.
    #[error("Unexpected payment processor response: {0}")]
    InvalidResponse(String),

    /// The request deadline passed before the call could be made.
    #[error("Request deadline exceeded before calling the payment processor")]
    DeadlineExceeded,

    /// An inbound webhook failed signature verification.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
}

/// Outbound calls to the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session. Not retried on failure.
    async fn create_checkout_session(
        &self,
        ctx: &RequestContext,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, BillingError>;

    /// Open a billing-portal session for `customer_id` that returns the
    /// customer to `return_url`.
    async fn create_portal_session(
        &self,
        ctx: &RequestContext,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError>;
}
