//! Handler for `POST /dev/simulate-order`.

use axum::extract::State;
use axum::http::StatusCode;
use mailroom_core::error::CoreError;
use mailroom_db::models::order::Order;
use serde::{Deserialize, Serialize};

use super::intake::{record_completed_checkout, CheckoutCompletion};
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::response::DataResponse;
use crate::state::AppState;

/// Prefix of generated simulation session ids.
pub const SIMULATED_SESSION_PREFIX: &str = "cs_test_";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateOrderRequest {
    pub session_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub quantity: Option<i64>,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimulatedOrder {
    pub order: Order,
    pub created: bool,
}

/// POST /api/v1/dev/simulate-order
///
/// Runs the same order creation as a completed checkout without the
/// payment processor. Answers 404 unless simulation is enabled.
pub async fn simulate_order(
    State(state): State<AppState>,
    Json(input): Json<SimulateOrderRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SimulatedOrder>>)> {
    if !state.config.allow_order_simulation {
        return Err(AppError::Core(CoreError::NotFoundBy {
            entity: "Route",
            field: "path",
            value: "/dev/simulate-order".into(),
        }));
    }

    let session_id = input
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("{SIMULATED_SESSION_PREFIX}{}", uuid::Uuid::new_v4().simple()));

    let completion = CheckoutCompletion {
        session_id,
        customer_email: input.customer_email,
        customer_name: input.customer_name,
        quantity: input.quantity,
        workspace_id: input.workspace_id,
        workspace_name: input.workspace_name,
        ..Default::default()
    };
    let outcome = record_completed_checkout(&state, &completion).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(DataResponse {
            data: SimulatedOrder {
                order: outcome.order,
                created: outcome.created,
            },
        }),
    ))
}
