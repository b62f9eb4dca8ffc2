//! Handlers for the `/orders` resource.

use axum::extract::{Path, Query, State};
use chrono::Utc;
use mailroom_core::error::CoreError;
use mailroom_core::order::{parse_admin_target, plan_status_change, OrderStatus};
use mailroom_core::types::DbId;
use mailroom_db::models::order::{Order, OrderDetail, OrderListQuery, UpdateOrderStatusRequest};
use mailroom_db::repositories::{
    clamp_limit, clamp_offset, ClientRepo, OnboardingRepo, OrderRepo, WorkspaceMemberRepo,
    WorkspaceRepo,
};

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn order_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Order", id })
}

/// Ensure `user` may see orders of `workspace_id`.
async fn ensure_member(state: &AppState, user: &AuthUser, workspace_id: DbId) -> AppResult<()> {
    if user.is_admin()
        || WorkspaceMemberRepo::is_member(&state.pool, workspace_id, user.user_id).await?
    {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Not a member of this workspace".into(),
        )))
    }
}

/// GET /api/v1/orders
///
/// Admins see every order (optionally filtered by `workspaceId`); other
/// users see the orders of workspaces they belong to.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<OrderListQuery>,
) -> AppResult<Json<DataResponse<Vec<Order>>>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let limit = clamp_limit(params.limit);
    let offset = clamp_offset(params.offset);

    let orders = match params.workspace_id {
        Some(workspace_id) => {
            ensure_member(&state, &user, workspace_id).await?;
            OrderRepo::list(&state.pool, Some(workspace_id), status, limit, offset).await?
        }
        None if user.is_admin() => {
            OrderRepo::list(&state.pool, None, status, limit, offset).await?
        }
        None => {
            OrderRepo::list_for_member(&state.pool, user.user_id, status, limit, offset).await?
        }
    };

    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/orders/{id}
///
/// The order with its workspace, client and onboarding answers.
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    ensure_member(&state, &user, order.workspace_id).await?;

    let workspace = WorkspaceRepo::find_by_id(&state.pool, order.workspace_id).await?;
    let client = ClientRepo::find_by_id(&state.pool, order.client_id).await?;
    let onboarding_data = OnboardingRepo::find_by_workspace(&state.pool, order.workspace_id)
        .await?
        .filter(|data| data.order_id == order.id);

    Ok(Json(DataResponse {
        data: OrderDetail {
            order,
            workspace,
            client,
            onboarding_data,
        },
    }))
}

/// PATCH /api/v1/orders/{id}
///
/// Operator status change. Accepts PENDING, DELIVERED or CANCELLED.
/// Disallowed moves and concurrent changes answer 409.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ctx: RequestContext,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<DataResponse<Order>>> {
    let target = parse_admin_target(input.status.as_deref())?;

    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;

    let Some(change) = plan_status_change(order.status, target, Utc::now())? else {
        return Ok(Json(DataResponse { data: order }));
    };

    let updated = OrderRepo::update_status(&state.pool, id, order.status, &change)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Order {id} changed status concurrently; reload and retry"
            )))
        })?;

    tracing::info!(
        request_id = %ctx.request_id,
        order_id = id,
        admin_id = admin.user_id,
        from = %order.status,
        to = %updated.status,
        "Order status changed"
    );

    Ok(Json(DataResponse { data: updated }))
}
