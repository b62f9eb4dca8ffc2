//! Handler for `POST /checkout-session`.

use axum::extract::State;
use axum::http::HeaderMap;
use mailroom_core::checkout::{build_session_request, CheckoutInput};
use mailroom_core::error::CoreError;
use mailroom_core::types::DbId;
use serde::{Deserialize, Serialize};

use super::workspaces::authorized_workspace;
use crate::context::RequestContext;
use crate::error::AppResult;
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body. `quantity` is kept as raw JSON so a non-integer value is
/// reported as a validation error rather than a body rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    pub quantity: Option<serde_json::Value>,
    pub customer_email: Option<String>,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

/// POST /api/v1/checkout-session
///
/// Validates the purchase and opens a hosted checkout session. Invalid
/// input is rejected before the payment processor is contacted.
///
/// Anyone may buy into a new workspace. Buying for an existing one
/// (`workspaceId`) requires a session for a member of that workspace.
pub async fn create_session(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Json(input): Json<CreateCheckoutSessionRequest>,
) -> AppResult<Json<CheckoutSessionResponse>> {
    let workspace_id = input
        .workspace_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let request = build_session_request(
        &state.config.checkout,
        &CheckoutInput {
            quantity: input.quantity.as_ref().and_then(serde_json::Value::as_i64),
            customer_email: input.customer_email.as_deref(),
            workspace_id,
            workspace_name: input.workspace_name.as_deref(),
        },
        &state.config.app_base_url,
    )?;

    if let Some(raw) = workspace_id {
        let user = AuthUser::from_headers(&headers, &state.config.jwt)?;
        let id = raw.parse::<DbId>().map_err(|_| {
            CoreError::Validation(format!("workspaceId '{raw}' is not a valid id"))
        })?;
        authorized_workspace(&state, &user, id).await?;
    }

    let session = state
        .gateway
        .create_checkout_session(&ctx, &request)
        .await?;

    tracing::info!(
        request_id = %ctx.request_id,
        session_id = %session.id,
        quantity = request.quantity,
        total_cents = request.total_cents,
        "Checkout session opened"
    );

    Ok(Json(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}
