//! Route definitions for the onboarding wizard.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

/// Routes mounted at `/onboarding`.
///
/// ```text
/// POST   /save                -> save
/// GET    /{session_id}        -> get_by_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/save", post(onboarding::save))
        .route("/{session_id}", get(onboarding::get_by_session))
}
