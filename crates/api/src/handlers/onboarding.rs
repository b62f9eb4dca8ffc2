//! Handlers for the post-purchase onboarding wizard.
//!
//! The checkout session id is the wizard's only credential: it arrives in
//! the success redirect and links every step to its order.

use axum::extract::{Path, State};
use chrono::Utc;
use mailroom_core::error::CoreError;
use mailroom_core::onboarding::{validate_answers, OnboardingAnswers};
use mailroom_core::validation::require_non_empty;
use mailroom_db::models::onboarding::OnboardingData;
use mailroom_db::models::order::Order;
use mailroom_db::repositories::{OnboardingRepo, OrderRepo};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::AppResult;
use crate::extract::Json;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOnboardingRequest {
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub answers: OnboardingAnswers,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOnboardingResponse {
    pub success: bool,
    pub onboarding_data: OnboardingData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingState {
    pub order: Order,
    pub onboarding_data: Option<OnboardingData>,
}

fn order_not_found(session_id: &str) -> CoreError {
    CoreError::NotFoundBy {
        entity: "Order",
        field: "sessionId",
        value: session_id.to_string(),
    }
}

/// POST /api/v1/onboarding/save
///
/// Saves one wizard step. Completing the wizard also completes the order,
/// in the same transaction.
pub async fn save(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<SaveOnboardingRequest>,
) -> AppResult<Json<SaveOnboardingResponse>> {
    let session_id = require_non_empty(input.session_id.as_deref(), "sessionId")?;
    validate_answers(&input.answers)?;

    let outcome =
        OnboardingRepo::save_for_session(&state.pool, session_id, input.answers, Utc::now())
            .await?
            .ok_or_else(|| order_not_found(session_id))?;

    tracing::debug!(
        request_id = %ctx.request_id,
        order_id = outcome.order.id,
        step = outcome.onboarding.step_completed,
        completed = outcome.onboarding.is_completed,
        "Onboarding step saved"
    );

    Ok(Json(SaveOnboardingResponse {
        success: true,
        onboarding_data: outcome.onboarding,
    }))
}

/// GET /api/v1/onboarding/{session_id}
///
/// Returns the order and any saved answers so the wizard can resume.
pub async fn get_by_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<DataResponse<OnboardingState>>> {
    let order = OrderRepo::find_by_session_id(&state.pool, &session_id)
        .await?
        .ok_or_else(|| order_not_found(&session_id))?;

    let onboarding_data = OnboardingRepo::find_by_workspace(&state.pool, order.workspace_id)
        .await?
        .filter(|data| data.order_id == order.id);

    Ok(Json(DataResponse {
        data: OnboardingState {
            order,
            onboarding_data,
        },
    }))
}
