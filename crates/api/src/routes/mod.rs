pub mod health;
pub mod onboarding;
pub mod orders;
pub mod workspaces;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /checkout-session                       open hosted checkout (POST, public)
/// /webhooks/stripe                        payment events (POST, signed)
/// /dev/simulate-order                     order creation without payment (POST, opt-in)
///
/// /onboarding/save                        save a wizard step (POST)
/// /onboarding/{session_id}                resume the wizard (GET)
///
/// /auth/session                           current session (GET, auth)
/// /billing/portal                         billing portal session (POST, auth)
///
/// /orders                                 list (auth)
/// /orders/{id}                            get (auth), update status (PATCH, admin)
///
/// /workspaces                             list, create (auth)
/// /workspaces/{id}                        get (member or admin)
/// /workspaces/{id}/clients                list, create
/// /workspaces/{id}/domains                list, create
/// /workspaces/{id}/inboxes                list, create
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout-session",
            post(handlers::checkout::create_session),
        )
        .route("/webhooks/stripe", post(handlers::webhooks::stripe))
        .route(
            "/dev/simulate-order",
            post(handlers::simulate::simulate_order),
        )
        .route("/auth/session", get(handlers::auth::current_session))
        .route(
            "/billing/portal",
            post(handlers::billing::create_portal_session),
        )
        .nest("/onboarding", onboarding::router())
        .nest("/orders", orders::router())
        .nest("/workspaces", workspaces::router())
}
