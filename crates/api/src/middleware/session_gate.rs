//! Authentication gate for path prefixes that always require a session.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::auth::AuthUser;
use crate::state::AppState;

/// Prefixes that never serve anonymous requests.
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/api/v1/workspaces",
    "/api/v1/orders",
    "/api/v1/billing",
    "/api/v1/auth/session",
];

pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Reject protected requests without a valid session with 401; otherwise
/// store the resolved [`AuthUser`] in request extensions.
pub async fn session_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !is_protected(request.uri().path()) {
        return next.run(request).await;
    }

    match AuthUser::from_headers(request.headers(), &state.config.jwt) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
