//! Repository for the `domains` table.

use mailroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::domain::Domain;

const COLUMNS: &str = "id, workspace_id, order_id, name, status, created_at, updated_at";

pub struct DomainRepo;

impl DomainRepo {
    /// Insert a domain in `PENDING` status. Names are globally unique
    /// (`uq_domains_name`).
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        name: &str,
        order_id: Option<DbId>,
    ) -> Result<Domain, sqlx::Error> {
        let query = format!(
            "INSERT INTO domains (workspace_id, name, order_id) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Domain>(&query)
            .bind(workspace_id)
            .bind(name)
            .bind(order_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Domain>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM domains WHERE id = $1");
        sqlx::query_as::<_, Domain>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_workspace(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<Domain>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM domains WHERE workspace_id = $1 ORDER BY name ASC"
        );
        sqlx::query_as::<_, Domain>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }
}
