//! Repository for the `workspaces` and `workspace_members` tables.

use mailroom_core::roles::WORKSPACE_ROLE_OWNER;
use mailroom_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::workspace::{NewWorkspace, Workspace, WorkspaceMember};

// ---------------------------------------------------------------------------
// WorkspaceRepo
// ---------------------------------------------------------------------------

/// Column list for `workspaces` queries.
const COLUMNS: &str = "id, slug, name, owner_id, billing_customer_id, created_at, updated_at";

/// Same list qualified with the `w.` alias for joins.
const W_COLUMNS: &str =
    "w.id, w.slug, w.name, w.owner_id, w.billing_customer_id, w.created_at, w.updated_at";

/// Provides CRUD operations for workspaces.
pub struct WorkspaceRepo;

impl WorkspaceRepo {
    /// Create a workspace and its owner membership in one transaction.
    ///
    /// Fails with a `uq_workspaces_slug` unique violation when the slug is
    /// taken; nothing is written in that case.
    pub async fn create(
        pool: &PgPool,
        input: &NewWorkspace,
    ) -> Result<Workspace, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO workspaces (slug, name, owner_id, billing_customer_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let workspace = sqlx::query_as::<_, Workspace>(&query)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(input.owner_id)
            .bind(&input.billing_customer_id)
            .fetch_one(&mut *tx)
            .await?;

        WorkspaceMemberRepo::add(&mut *tx, workspace.id, input.owner_id, WORKSPACE_ROLE_OWNER)
            .await?;

        tx.commit().await?;
        Ok(workspace)
    }

    /// Insert a workspace keyed by slug, or return the existing row as-is.
    pub async fn upsert_by_slug<'e, E>(
        executor: E,
        input: &NewWorkspace,
    ) -> Result<Workspace, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO workspaces (slug, name, owner_id, billing_customer_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (slug) DO UPDATE SET slug = workspaces.slug \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(input.owner_id)
            .bind(&input.billing_customer_id)
            .fetch_one(executor)
            .await
    }

    /// Record a billing customer id on a workspace that has none yet.
    /// An existing id is never replaced.
    pub async fn set_billing_customer<'e, E>(
        executor: E,
        id: DbId,
        customer_id: &str,
    ) -> Result<Option<Workspace>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE workspaces SET billing_customer_id = $2 \
             WHERE id = $1 AND billing_customer_id IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .bind(customer_id)
            .fetch_optional(executor)
            .await
    }

    /// Find a workspace by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Workspace>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workspaces WHERE id = $1");
        sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a workspace the user is a member of (any role).
    pub async fn find_for_member<'e, E>(
        executor: E,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Workspace>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {W_COLUMNS} FROM workspaces w \
             JOIN workspace_members m ON m.workspace_id = w.id \
             WHERE w.id = $1 AND m.user_id = $2"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Find a workspace by its slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Workspace>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workspaces WHERE slug = $1");
        sqlx::query_as::<_, Workspace>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List every workspace, newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Workspace>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workspaces ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List the workspaces a user belongs to, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Workspace>, sqlx::Error> {
        let query = format!(
            "SELECT {W_COLUMNS} FROM workspaces w \
             JOIN workspace_members m ON m.workspace_id = w.id \
             WHERE m.user_id = $1 \
             ORDER BY w.created_at DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// WorkspaceMemberRepo
// ---------------------------------------------------------------------------

/// Column list for `workspace_members` queries.
const MEMBER_COLUMNS: &str = "id, workspace_id, user_id, role, created_at";

/// Provides membership operations for workspaces.
pub struct WorkspaceMemberRepo;

impl WorkspaceMemberRepo {
    /// Add a user to a workspace. An existing membership is kept unchanged.
    pub async fn add<'e, E>(
        executor: E,
        workspace_id: DbId,
        user_id: DbId,
        role: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO workspace_members (workspace_id, user_id, role) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (workspace_id, user_id) DO NOTHING",
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(role)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Whether the user is a member (any role) of the workspace.
    pub async fn is_member<'e, E>(
        executor: E,
        workspace_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (\
                SELECT 1 FROM workspace_members WHERE workspace_id = $1 AND user_id = $2\
             )",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// List the members of a workspace, oldest first.
    pub async fn list_for_workspace(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<WorkspaceMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM workspace_members \
             WHERE workspace_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, WorkspaceMember>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }
}
