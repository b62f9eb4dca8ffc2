//! Client (workspace contact) model and DTOs.

use mailroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: DbId,
    pub workspace_id: DbId,
    pub name: String,
    pub email: String,
    /// Identifiers of the products this client has purchased.
    pub products: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for adding a client to a workspace.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

/// Validated input for inserting a client row.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub workspace_id: DbId,
    pub name: String,
    pub email: String,
    pub products: Vec<String>,
}
