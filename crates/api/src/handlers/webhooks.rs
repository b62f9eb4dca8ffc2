//! Handler for `POST /webhooks/stripe`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use super::intake::{record_completed_checkout, CheckoutCompletion};
use crate::billing::webhook::{
    verify_signature, CompletedCheckoutSession, WebhookEvent, CHECKOUT_COMPLETED,
    SIGNATURE_HEADER,
};
use crate::billing::BillingError;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/webhooks/stripe
///
/// Verifies the delivery signature over the raw body, then records the
/// order for `checkout.session.completed`. Other event types are
/// acknowledged and ignored.
pub async fn stripe(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BillingError::InvalidSignature("missing signature header".into()))?;

    verify_signature(
        &body,
        signature,
        &state.config.stripe.webhook_secret,
        chrono::Utc::now().timestamp(),
    )?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed event: {e}")))?;

    if event.event_type != CHECKOUT_COMPLETED {
        tracing::debug!(
            request_id = %ctx.request_id,
            event_id = %event.id,
            event_type = %event.event_type,
            "Ignoring webhook event"
        );
        return Ok(Json(json!({ "received": true })));
    }

    let session: CompletedCheckoutSession = serde_json::from_value(event.data.object)
        .map_err(|e| AppError::BadRequest(format!("Malformed checkout session: {e}")))?;

    let outcome = record_completed_checkout(&state, &CheckoutCompletion::from(&session)).await?;

    tracing::info!(
        request_id = %ctx.request_id,
        event_id = %event.id,
        order_id = outcome.order.id,
        created = outcome.created,
        "Checkout completion processed"
    );

    Ok(Json(json!({
        "received": true,
        "orderId": outcome.order.id,
        "created": outcome.created,
    })))
}
