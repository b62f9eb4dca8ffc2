//! Inbound payment-processor events.
//!
//! The processor signs each delivery with HMAC-SHA256 over
//! `"{timestamp}.{raw body}"` and sends the result in a header of the form
//! `t=<unix secs>,v1=<hex mac>[,v1=<hex mac>...]`. Deliveries older than
//! [`SIGNATURE_TOLERANCE_SECS`] are rejected to bound replays.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::BillingError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted age (and clock skew) of a signed delivery.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Event type emitted when a hosted checkout is paid.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Verify a delivery signature against the endpoint secret.
///
/// `now` is the current Unix time in seconds.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), BillingError> {
    if secret.is_empty() {
        return Err(BillingError::InvalidSignature(
            "webhook secret is not configured".into(),
        ));
    }

    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse().ok(),
            Some(("v1", v)) => signatures.push(v),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| BillingError::InvalidSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(BillingError::InvalidSignature("missing v1 signature".into()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(BillingError::InvalidSignature(
            "timestamp outside tolerance".into(),
        ));
    }

    let matches = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });

    if matches {
        Ok(())
    } else {
        Err(BillingError::InvalidSignature("signature mismatch".into()))
    }
}

/// Compute the `t=..,v1=..` header for a payload. Used by tooling and tests
/// to produce deliveries the server accepts.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return format!("t={timestamp}"),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Envelope shared by every event.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The fields of a completed checkout session this system reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedCheckoutSession {
    pub id: String,
    /// Processor customer id, present when a customer was created.
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl CompletedCheckoutSession {
    /// Buyer email, preferring what the customer entered on the page.
    pub fn email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
    }

    pub fn name(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|d| d.name.as_deref())
    }
}
