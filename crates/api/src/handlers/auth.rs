//! Handler for `GET /auth/session`.

use axum::Json;
use mailroom_core::types::DbId;
use serde::Serialize;

use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: DbId,
    pub role: String,
}

/// GET /api/v1/auth/session
///
/// Echoes the identity carried by the caller's session token.
pub async fn current_session(user: AuthUser) -> Json<DataResponse<SessionInfo>> {
    Json(DataResponse {
        data: SessionInfo {
            user_id: user.user_id,
            role: user.role,
        },
    })
}
