//! Sending-domain model and DTOs.

use mailroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `domains` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: Option<DbId>,
    pub name: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDomainRequest {
    pub name: Option<String>,
    pub order_id: Option<DbId>,
}
