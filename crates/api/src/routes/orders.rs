//! Route definitions for the `/orders` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET    /                    -> list
/// GET    /{id}                -> get_by_id
/// PATCH  /{id}                -> update_status (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::get_by_id).patch(orders::update_status))
}
