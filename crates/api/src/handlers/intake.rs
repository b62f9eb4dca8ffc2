//! Order creation from a completed checkout, shared by the payment webhook
//! and the development simulation endpoint.

use mailroom_core::checkout::{META_QUANTITY, META_WORKSPACE_ID, META_WORKSPACE_NAME};
use mailroom_core::error::CoreError;
use mailroom_core::slug::{default_workspace_name, slug_for_workspace_name};
use mailroom_core::types::DbId;
use mailroom_core::validation::require_email;
use mailroom_db::models::order::{CheckoutOrderOutcome, NewCheckoutOrder};
use mailroom_db::repositories::OrderRepo;

use crate::billing::webhook::CompletedCheckoutSession;
use crate::error::AppResult;
use crate::state::AppState;

/// Everything known about a paid checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutCompletion {
    pub session_id: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub quantity: Option<i64>,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub billing_customer_id: Option<String>,
}

impl From<&CompletedCheckoutSession> for CheckoutCompletion {
    fn from(session: &CompletedCheckoutSession) -> Self {
        let meta = |key: &str| {
            session
                .metadata
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            session_id: session.id.clone(),
            customer_email: session.email().map(str::to_string),
            customer_name: session.name().map(str::to_string),
            quantity: meta(META_QUANTITY).and_then(|q| q.parse().ok()),
            workspace_id: meta(META_WORKSPACE_ID),
            workspace_name: meta(META_WORKSPACE_NAME),
            amount_total: session.amount_total,
            currency: session.currency.clone(),
            billing_customer_id: session.customer.clone(),
        }
    }
}

/// Create (or return the existing) order for a completed checkout.
pub async fn record_completed_checkout(
    state: &AppState,
    completion: &CheckoutCompletion,
) -> AppResult<CheckoutOrderOutcome> {
    let policy = &state.config.checkout;

    if completion.session_id.trim().is_empty() {
        return Err(CoreError::Validation("sessionId must not be empty".into()).into());
    }
    let email = require_email(completion.customer_email.as_deref(), "customerEmail")?;
    let quantity = policy.validate_quantity(completion.quantity)?;

    let (workspace_name, workspace_slug) = resolve_workspace(completion, email)?;
    let workspace_id = completion
        .workspace_id
        .as_deref()
        .and_then(|id| id.parse::<DbId>().ok());

    let input = NewCheckoutOrder {
        session_id: completion.session_id.clone(),
        customer_email: email.to_lowercase(),
        customer_name: completion
            .customer_name
            .clone()
            .filter(|n| !n.trim().is_empty()),
        workspace_id,
        workspace_name,
        // Bounded by max_quantity, which is validated at start-up.
        quantity: i32::try_from(quantity).map_err(|_| {
            CoreError::Validation(format!("quantity {quantity} is out of range"))
        })?,
        total_cents: completion
            .amount_total
            .unwrap_or_else(|| policy.total_cents(quantity)),
        currency: completion
            .currency
            .clone()
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| policy.currency.clone()),
        billing_customer_id: completion.billing_customer_id.clone(),
    };

    let outcome = OrderRepo::create_from_checkout(&state.pool, &input, &workspace_slug).await?;
    if !outcome.created {
        tracing::info!(
            session_id = %input.session_id,
            order_id = outcome.order.id,
            "Checkout already recorded"
        );
    }
    Ok(outcome)
}

/// Pick the workspace name and slug for a completion: the supplied name,
/// falling back to one derived from the email. Whether the purchase lands
/// in that workspace, in the one named by `workspaceId`, or in a fresh
/// one is decided at write time from the buyer's memberships.
fn resolve_workspace(completion: &CheckoutCompletion, email: &str) -> AppResult<(String, String)> {
    let fallback = default_workspace_name(email);
    let name = completion
        .workspace_name
        .clone()
        .unwrap_or_else(|| fallback.clone());

    match slug_for_workspace_name(&name) {
        Ok(slug) => Ok((name, slug)),
        Err(_) => {
            let slug = slug_for_workspace_name(&fallback)?;
            Ok((fallback, slug))
        }
    }
}
