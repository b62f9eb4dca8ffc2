//! Repository for the `clients` table.

use mailroom_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::client::{Client, NewClient};

/// Column list for `clients` queries.
const COLUMNS: &str = "id, workspace_id, name, email, products, created_at, updated_at";

/// Provides CRUD operations for workspace clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Insert a new client. Duplicate emails within a workspace violate
    /// `uq_clients_workspace_email`.
    pub async fn create(pool: &PgPool, input: &NewClient) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (workspace_id, name, email, products) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(input.workspace_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.products)
            .fetch_one(pool)
            .await
    }

    /// Insert a client keyed by `(workspace_id, email)`, or return the
    /// existing row unchanged.
    pub async fn upsert_for_workspace<'e, E>(
        executor: E,
        input: &NewClient,
    ) -> Result<Client, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO clients (workspace_id, name, email, products) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (workspace_id, email) DO UPDATE SET email = clients.email \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(input.workspace_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.products)
            .fetch_one(executor)
            .await
    }

    /// Find a client by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the clients of a workspace, alphabetically.
    pub async fn list_by_workspace(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<Client>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clients WHERE workspace_id = $1 ORDER BY name ASC, id ASC"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }
}
