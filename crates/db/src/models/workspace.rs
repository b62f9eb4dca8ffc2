//! Workspace (tenant) and membership models and DTOs.

use mailroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `workspaces` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub owner_id: DbId,
    pub billing_customer_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for creating a workspace.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub name: Option<String>,
}

/// Validated input for inserting a workspace row.
#[derive(Debug, Clone)]
pub struct NewWorkspace {
    pub slug: String,
    pub name: String,
    pub owner_id: DbId,
    pub billing_customer_id: Option<String>,
}

/// A row from the `workspace_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub id: DbId,
    pub workspace_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub created_at: Timestamp,
}
