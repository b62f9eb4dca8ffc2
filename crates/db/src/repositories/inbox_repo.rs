//! Repository for the `inboxes` table.

use mailroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::inbox::{Inbox, NewInbox};

const COLUMNS: &str = "id, workspace_id, domain_id, email_address, first_name, last_name, \
                       status, created_at, updated_at";

pub struct InboxRepo;

impl InboxRepo {
    /// Insert an inbox in `PENDING` status. Addresses are globally unique
    /// (`uq_inboxes_email_address`).
    pub async fn create(pool: &PgPool, input: &NewInbox) -> Result<Inbox, sqlx::Error> {
        let query = format!(
            "INSERT INTO inboxes (workspace_id, domain_id, email_address, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Inbox>(&query)
            .bind(input.workspace_id)
            .bind(input.domain_id)
            .bind(&input.email_address)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_one(pool)
            .await
    }

    pub async fn list_by_workspace(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<Inbox>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inboxes WHERE workspace_id = $1 ORDER BY email_address ASC"
        );
        sqlx::query_as::<_, Inbox>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }
}
