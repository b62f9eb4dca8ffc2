//! Route definitions for the `/workspaces` resource.
//!
//! Clients, domains and inboxes are nested under `/workspaces/{id}/...`.

use axum::routing::get;
use axum::Router;

use crate::handlers::workspaces;
use crate::state::AppState;

/// Routes mounted at `/workspaces`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /{id}                -> get_by_id
/// GET    /{id}/clients        -> list_clients
/// POST   /{id}/clients        -> create_client
/// GET    /{id}/domains        -> list_domains
/// POST   /{id}/domains        -> create_domain
/// GET    /{id}/inboxes        -> list_inboxes
/// POST   /{id}/inboxes        -> create_inbox
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(workspaces::list).post(workspaces::create))
        .route("/{id}", get(workspaces::get_by_id))
        .route(
            "/{id}/clients",
            get(workspaces::list_clients).post(workspaces::create_client),
        )
        .route(
            "/{id}/domains",
            get(workspaces::list_domains).post(workspaces::create_domain),
        )
        .route(
            "/{id}/inboxes",
            get(workspaces::list_inboxes).post(workspaces::create_inbox),
        )
}
