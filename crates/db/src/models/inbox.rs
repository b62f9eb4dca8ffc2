//! Inbox (mailbox on a workspace domain) model and DTOs.

use mailroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `inboxes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub id: DbId,
    pub workspace_id: DbId,
    pub domain_id: DbId,
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for creating an inbox. The address is
/// `{local_part}@{domain.name}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInboxRequest {
    pub domain_id: Option<DbId>,
    pub local_part: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Validated input for inserting an inbox row.
#[derive(Debug, Clone)]
pub struct NewInbox {
    pub workspace_id: DbId,
    pub domain_id: DbId,
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
}
