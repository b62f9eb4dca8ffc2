//! Checkout pricing and request validation.
//!
//! The payment processor owns the hosted checkout page; this module decides
//! what is sent to it: the validated quantity, the line-item price, the
//! redirect URLs and the metadata echoed back on completion.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::validation::require_email;

/// Template token the processor substitutes with the session id in the
/// success URL.
pub const SESSION_ID_TOKEN: &str = "{CHECKOUT_SESSION_ID}";

/// Display name of the purchased line item.
pub const LINE_ITEM_NAME: &str = "Email Inbox";

/// Metadata keys echoed back by the processor on completion.
pub const META_WORKSPACE_ID: &str = "workspaceId";
pub const META_WORKSPACE_NAME: &str = "workspaceName";
pub const META_QUANTITY: &str = "quantity";

/// Pricing and quantity bounds for inbox purchases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPolicy {
    /// Smallest purchasable quantity (inclusive).
    pub min_quantity: i64,
    /// Largest purchasable quantity (inclusive).
    pub max_quantity: i64,
    /// Price of one inbox in minor currency units.
    pub unit_price_cents: i64,
    /// ISO currency code, lowercase.
    pub currency: String,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            min_quantity: 1,
            max_quantity: 100,
            unit_price_cents: 300,
            currency: "usd".to_string(),
        }
    }
}

impl CheckoutPolicy {
    /// Total charge for `quantity` units, in minor units.
    pub fn total_cents(&self, quantity: i64) -> i64 {
        quantity * self.unit_price_cents
    }

    /// Reject quantities outside the configured bounds.
    pub fn validate_quantity(&self, quantity: Option<i64>) -> Result<i64, CoreError> {
        match quantity {
            Some(q) if (self.min_quantity..=self.max_quantity).contains(&q) => Ok(q),
            _ => Err(CoreError::Validation(format!(
                "quantity must be an integer between {} and {}",
                self.min_quantity, self.max_quantity
            ))),
        }
    }
}

/// Raw checkout input as received from the client.
#[derive(Debug, Clone, Default)]
pub struct CheckoutInput<'a> {
    pub quantity: Option<i64>,
    pub customer_email: Option<&'a str>,
    pub workspace_id: Option<&'a str>,
    pub workspace_name: Option<&'a str>,
}

/// Everything the processor needs to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub quantity: i64,
    pub customer_email: String,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub line_item_name: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

/// Validate checkout input and build the processor request.
///
/// `app_base_url` is the public origin of the web app; the success URL
/// points at the onboarding wizard and carries [`SESSION_ID_TOKEN`].
pub fn build_session_request(
    policy: &CheckoutPolicy,
    input: &CheckoutInput<'_>,
    app_base_url: &str,
) -> Result<CheckoutSessionRequest, CoreError> {
    let quantity = policy.validate_quantity(input.quantity)?;
    let customer_email = require_email(input.customer_email, "customerEmail")?;

    let base = app_base_url.trim_end_matches('/');

    let mut metadata = BTreeMap::new();
    metadata.insert(META_QUANTITY.to_string(), quantity.to_string());
    if let Some(id) = input.workspace_id.filter(|s| !s.is_empty()) {
        metadata.insert(META_WORKSPACE_ID.to_string(), id.to_string());
    }
    if let Some(name) = input.workspace_name.filter(|s| !s.is_empty()) {
        metadata.insert(META_WORKSPACE_NAME.to_string(), name.to_string());
    }

    Ok(CheckoutSessionRequest {
        quantity,
        customer_email: customer_email.to_string(),
        unit_price_cents: policy.unit_price_cents,
        total_cents: policy.total_cents(quantity),
        currency: policy.currency.clone(),
        line_item_name: LINE_ITEM_NAME.to_string(),
        success_url: format!("{base}/onboarding?session_id={SESSION_ID_TOKEN}"),
        cancel_url: format!("{base}/checkout?canceled=true"),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn input(quantity: Option<i64>, email: Option<&str>) -> CheckoutInput<'_> {
        CheckoutInput {
            quantity,
            customer_email: email,
            ..Default::default()
        }
    }

    #[test]
    fn every_quantity_in_bounds_is_accepted() {
        let policy = CheckoutPolicy::default();
        for q in 1..=100 {
            let req = build_session_request(&policy, &input(Some(q), Some("a@b.io")), "https://app")
                .unwrap();
            assert_eq!(req.quantity, q);
            assert_eq!(req.total_cents, q * 300);
        }
    }

    #[test]
    fn out_of_bounds_quantity_is_rejected() {
        let policy = CheckoutPolicy::default();
        for q in [Some(0), Some(101), Some(-5), None] {
            assert_matches!(
                build_session_request(&policy, &input(q, Some("a@b.io")), "https://app"),
                Err(CoreError::Validation(_))
            );
        }
    }

    #[test]
    fn missing_email_is_rejected() {
        let policy = CheckoutPolicy::default();
        assert_matches!(
            build_session_request(&policy, &input(Some(2), None), "https://app"),
            Err(CoreError::Validation(msg)) if msg.contains("customerEmail")
        );
    }

    #[test]
    fn success_url_carries_session_token() {
        let policy = CheckoutPolicy::default();
        let req =
            build_session_request(&policy, &input(Some(2), Some("a@b.io")), "https://app.test/")
                .unwrap();
        assert_eq!(
            req.success_url,
            "https://app.test/onboarding?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(req.cancel_url, "https://app.test/checkout?canceled=true");
    }

    #[test]
    fn metadata_echoes_workspace_and_quantity() {
        let policy = CheckoutPolicy::default();
        let req = build_session_request(
            &policy,
            &CheckoutInput {
                quantity: Some(7),
                customer_email: Some("a@b.io"),
                workspace_id: Some("42"),
                workspace_name: Some("Acme"),
            },
            "https://app",
        )
        .unwrap();
        assert_eq!(req.metadata[META_QUANTITY], "7");
        assert_eq!(req.metadata[META_WORKSPACE_ID], "42");
        assert_eq!(req.metadata[META_WORKSPACE_NAME], "Acme");
    }

    #[test]
    fn custom_bounds_apply() {
        let policy = CheckoutPolicy {
            min_quantity: 5,
            max_quantity: 10,
            unit_price_cents: 450,
            currency: "eur".into(),
        };
        assert!(policy.validate_quantity(Some(4)).is_err());
        assert_eq!(policy.validate_quantity(Some(10)).unwrap(), 10);
        assert_eq!(policy.total_cents(10), 4500);
    }
}
