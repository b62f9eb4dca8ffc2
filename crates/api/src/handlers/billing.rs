//! Handler for `POST /billing/portal`.

use axum::extract::State;
use mailroom_core::error::CoreError;
use mailroom_core::types::DbId;
use serde::{Deserialize, Serialize};

use super::workspaces::authorized_workspace;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePortalSessionRequest {
    pub workspace_id: Option<DbId>,
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalSessionResponse {
    pub url: String,
}

/// POST /api/v1/billing/portal
///
/// Opens the processor's billing portal for the workspace's customer.
pub async fn create_portal_session(
    State(state): State<AppState>,
    user: AuthUser,
    ctx: RequestContext,
    Json(input): Json<CreatePortalSessionRequest>,
) -> AppResult<Json<PortalSessionResponse>> {
    let workspace_id = input
        .workspace_id
        .ok_or_else(|| CoreError::Validation("workspaceId is required".into()))?;
    let workspace = authorized_workspace(&state, &user, workspace_id).await?;

    let customer_id = workspace.billing_customer_id.ok_or_else(|| {
        AppError::Core(CoreError::NotFoundBy {
            entity: "Billing customer",
            field: "workspaceId",
            value: workspace_id.to_string(),
        })
    })?;

    let return_url = input
        .return_url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "{}/workspaces/{workspace_id}",
                state.config.app_base_url.trim_end_matches('/')
            )
        });

    let portal = state
        .gateway
        .create_portal_session(&ctx, &customer_id, &return_url)
        .await?;

    tracing::info!(
        request_id = %ctx.request_id,
        workspace_id,
        "Billing portal session opened"
    );
    Ok(Json(PortalSessionResponse { url: portal.url }))
}
