//! Handlers for the `/workspaces` resource and its tenant-scoped children.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use mailroom_core::error::CoreError;
use mailroom_core::slug::slug_for_workspace_name;
use mailroom_core::types::DbId;
use mailroom_core::validation::{normalize_domain, require_email, require_non_empty};
use mailroom_db::models::client::{Client, CreateClientRequest, NewClient};
use mailroom_db::models::domain::{CreateDomainRequest, Domain};
use mailroom_db::models::inbox::{CreateInboxRequest, Inbox, NewInbox};
use mailroom_db::models::workspace::{CreateWorkspaceRequest, NewWorkspace, Workspace};
use mailroom_db::repositories::{
    clamp_limit, clamp_offset, ClientRepo, DomainRepo, InboxRepo, OrderRepo,
    WorkspaceMemberRepo, WorkspaceRepo,
};

use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a workspace the caller may act on: admins see every workspace,
/// other users only those they belong to.
pub(crate) async fn authorized_workspace(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<Workspace> {
    let workspace = WorkspaceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Workspace",
            id,
        }))?;

    if !user.is_admin()
        && !WorkspaceMemberRepo::is_member(&state.pool, id, user.user_id).await?
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not a member of this workspace".into(),
        )));
    }
    Ok(workspace)
}

// ---------------------------------------------------------------------------
// Workspaces
// ---------------------------------------------------------------------------

/// POST /api/v1/workspaces
///
/// The caller becomes the owner. A name whose slug is taken answers 409.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateWorkspaceRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Workspace>>)> {
    let name = require_non_empty(input.name.as_deref(), "name")?;
    let slug = slug_for_workspace_name(name)?;

    let workspace = WorkspaceRepo::create(
        &state.pool,
        &NewWorkspace {
            slug,
            name: name.to_string(),
            owner_id: user.user_id,
            billing_customer_id: None,
        },
    )
    .await?;

    tracing::info!(
        workspace_id = workspace.id,
        slug = %workspace.slug,
        owner_id = user.user_id,
        "Workspace created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: workspace })))
}

/// GET /api/v1/workspaces
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Workspace>>>> {
    let limit = clamp_limit(params.limit);
    let offset = clamp_offset(params.offset);

    let workspaces = if user.is_admin() {
        WorkspaceRepo::list(&state.pool, limit, offset).await?
    } else {
        WorkspaceRepo::list_for_user(&state.pool, user.user_id, limit, offset).await?
    };
    Ok(Json(DataResponse { data: workspaces }))
}

/// GET /api/v1/workspaces/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Workspace>>> {
    let workspace = authorized_workspace(&state, &user, id).await?;
    Ok(Json(DataResponse { data: workspace }))
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// GET /api/v1/workspaces/{id}/clients
pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Client>>>> {
    authorized_workspace(&state, &user, id).await?;
    let clients = ClientRepo::list_by_workspace(&state.pool, id).await?;
    Ok(Json(DataResponse { data: clients }))
}

/// POST /api/v1/workspaces/{id}/clients
pub async fn create_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CreateClientRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Client>>)> {
    authorized_workspace(&state, &user, id).await?;
    let name = require_non_empty(input.name.as_deref(), "name")?;
    let email = require_email(input.email.as_deref(), "email")?;

    let client = ClientRepo::create(
        &state.pool,
        &NewClient {
            workspace_id: id,
            name: name.to_string(),
            email: email.to_lowercase(),
            products: input.products,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: client })))
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

/// GET /api/v1/workspaces/{id}/domains
pub async fn list_domains(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Domain>>>> {
    authorized_workspace(&state, &user, id).await?;
    let domains = DomainRepo::list_by_workspace(&state.pool, id).await?;
    Ok(Json(DataResponse { data: domains }))
}

/// POST /api/v1/workspaces/{id}/domains
///
/// An `orderId`, when given, must belong to the same workspace.
pub async fn create_domain(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CreateDomainRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Domain>>)> {
    authorized_workspace(&state, &user, id).await?;
    let name = normalize_domain(require_non_empty(input.name.as_deref(), "name")?)?;

    if let Some(order_id) = input.order_id {
        let order = OrderRepo::find_by_id(&state.pool, order_id).await?;
        if order.is_none_or(|o| o.workspace_id != id) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "orderId {order_id} does not belong to workspace {id}"
            ))));
        }
    }

    let domain = DomainRepo::create(&state.pool, id, &name, input.order_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: domain })))
}

// ---------------------------------------------------------------------------
// Inboxes
// ---------------------------------------------------------------------------

/// GET /api/v1/workspaces/{id}/inboxes
pub async fn list_inboxes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Inbox>>>> {
    authorized_workspace(&state, &user, id).await?;
    let inboxes = InboxRepo::list_by_workspace(&state.pool, id).await?;
    Ok(Json(DataResponse { data: inboxes }))
}

/// POST /api/v1/workspaces/{id}/inboxes
///
/// The address is `{localPart}@{domain}`, where the domain must belong to
/// the workspace.
pub async fn create_inbox(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CreateInboxRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Inbox>>)> {
    authorized_workspace(&state, &user, id).await?;

    let domain_id = input
        .domain_id
        .ok_or_else(|| CoreError::Validation("domainId is required".into()))?;
    let domain = DomainRepo::find_by_id(&state.pool, domain_id)
        .await?
        .filter(|d| d.workspace_id == id)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "domainId {domain_id} does not belong to workspace {id}"
            ))
        })?;

    let local_part = require_non_empty(input.local_part.as_deref(), "localPart")?.to_lowercase();
    let email_address = format!("{local_part}@{}", domain.name);
    require_email(Some(email_address.as_str()), "localPart")?;

    let inbox = InboxRepo::create(
        &state.pool,
        &NewInbox {
            workspace_id: id,
            domain_id,
            email_address,
            first_name: require_non_empty(input.first_name.as_deref(), "firstName")?.to_string(),
            last_name: require_non_empty(input.last_name.as_deref(), "lastName")?.to_string(),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: inbox })))
}
