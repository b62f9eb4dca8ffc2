//! Repository for the `orders` table, including the purchase-time
//! reconciliation that creates an order with its user, workspace and client.

use chrono::Utc;
use mailroom_core::order::{
    order_number, provisioning_for, OrderStatus, StatusChange, PRODUCT_EMAIL_INBOXES,
};
use mailroom_core::roles::WORKSPACE_ROLE_OWNER;
use mailroom_core::slug::suffixed_slug;
use mailroom_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::client::NewClient;
use crate::models::order::{CheckoutOrderOutcome, NewCheckoutOrder, Order};
use crate::models::workspace::{NewWorkspace, Workspace};
use crate::repositories::{ClientRepo, UserRepo, WorkspaceMemberRepo, WorkspaceRepo};

/// Column list for `orders` queries.
const COLUMNS: &str = "id, order_number, session_id, workspace_id, client_id, total_cents, \
                       currency, quantity, inbox_count, domain_count, status, \
                       created_at, updated_at, fulfilled_at";

/// Attempts at picking an unused order number before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Numbered slug variants tried before falling back to a session suffix.
const WORKSPACE_SLUG_ATTEMPTS: u32 = 10;

/// Provides CRUD and lifecycle operations for orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Find an order by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the order created for a checkout session.
    pub async fn find_by_session_id<'e, E>(
        executor: E,
        session_id: &str,
    ) -> Result<Option<Order>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE session_id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(session_id)
            .fetch_optional(executor)
            .await
    }

    /// Same as [`Self::find_by_session_id`] but locks the row until the
    /// surrounding transaction ends.
    pub async fn lock_by_session_id<'e, E>(
        executor: E,
        session_id: &str,
    ) -> Result<Option<Order>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE session_id = $1 FOR UPDATE");
        sqlx::query_as::<_, Order>(&query)
            .bind(session_id)
            .fetch_optional(executor)
            .await
    }

    /// List orders newest first, optionally filtered by workspace and status.
    pub async fn list(
        pool: &PgPool,
        workspace_id: Option<DbId>,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE ($1::BIGINT IS NULL OR workspace_id = $1) \
               AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(workspace_id)
            .bind(status.map(OrderStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List orders of every workspace the user belongs to.
    pub async fn list_for_member(
        pool: &PgPool,
        user_id: DbId,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE workspace_id IN (SELECT workspace_id FROM workspace_members WHERE user_id = $1) \
               AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(status.map(OrderStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Record a completed checkout.
    ///
    /// Idempotent by session id: if an order already exists for
    /// `input.session_id` it is returned unchanged with `created = false`.
    /// Otherwise, in one transaction, the user (by email), workspace (see
    /// [`Self::claim_workspace`]) and client (by workspace and email) are
    /// upserted without touching existing rows, and a PLACED order is
    /// inserted.
    pub async fn create_from_checkout(
        pool: &PgPool,
        input: &NewCheckoutOrder,
        workspace_slug: &str,
    ) -> Result<CheckoutOrderOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(order) = Self::find_by_session_id(&mut *tx, &input.session_id).await? {
            tx.commit().await?;
            return Ok(CheckoutOrderOutcome {
                order,
                created: false,
            });
        }

        let user = UserRepo::upsert_by_email(
            &mut *tx,
            &input.customer_email,
            input.customer_name.as_deref(),
        )
        .await?;

        let workspace = Self::claim_workspace(&mut *tx, input, user.id, workspace_slug).await?;

        if let Some(customer_id) = input.billing_customer_id.as_deref() {
            if workspace.billing_customer_id.is_none() {
                WorkspaceRepo::set_billing_customer(&mut *tx, workspace.id, customer_id)
                    .await?;
            }
        }

        let client = ClientRepo::upsert_for_workspace(
            &mut *tx,
            &NewClient {
                workspace_id: workspace.id,
                name: input
                    .customer_name
                    .clone()
                    .unwrap_or_else(|| input.customer_email.clone()),
                email: input.customer_email.clone(),
                products: vec![PRODUCT_EMAIL_INBOXES.to_string()],
            },
        )
        .await?;

        let provisioning = provisioning_for(input.quantity);
        let query = format!(
            "INSERT INTO orders (order_number, session_id, workspace_id, client_id, total_cents, \
                                 currency, quantity, inbox_count, domain_count, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT DO NOTHING \
             RETURNING {COLUMNS}"
        );

        // Order numbers are millisecond timestamps; on a collision with an
        // order from another session, move to the next millisecond.
        let mut issued_at = Utc::now();
        let mut outcome = None;
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let inserted = sqlx::query_as::<_, Order>(&query)
                .bind(order_number(issued_at))
                .bind(&input.session_id)
                .bind(workspace.id)
                .bind(client.id)
                .bind(input.total_cents)
                .bind(&input.currency)
                .bind(input.quantity)
                .bind(provisioning.inbox_count)
                .bind(provisioning.domain_count)
                .bind(OrderStatus::Placed.as_str())
                .fetch_optional(&mut *tx)
                .await?;

            if let Some(order) = inserted {
                outcome = Some(CheckoutOrderOutcome {
                    order,
                    created: true,
                });
                break;
            }
            // A concurrent delivery of the same session won the insert.
            if let Some(order) = Self::find_by_session_id(&mut *tx, &input.session_id).await? {
                outcome = Some(CheckoutOrderOutcome {
                    order,
                    created: false,
                });
                break;
            }
            issued_at += chrono::Duration::milliseconds(1);
        }

        let outcome = outcome.ok_or_else(|| {
            sqlx::Error::Protocol("could not allocate a unique order number".to_string())
        })?;

        tx.commit().await?;

        if outcome.created {
            tracing::info!(
                order_id = outcome.order.id,
                order_number = %outcome.order.order_number,
                workspace_id = workspace.id,
                quantity = input.quantity,
                "Order created from checkout"
            );
        }
        Ok(outcome)
    }

    /// Pick the workspace a checkout is recorded against. Never adds the
    /// buyer to a workspace they do not already belong to.
    ///
    /// 1. `input.workspace_id`, if the buyer is a member of it.
    /// 2. The workspace at `base_slug`, if the buyer owns it or is a member.
    /// 3. Otherwise a new workspace owned by the buyer, at the first free
    ///    numbered variant of `base_slug` (`acme-2`, `acme-3`, ...) and
    ///    finally at one suffixed with the session id.
    async fn claim_workspace(
        conn: &mut PgConnection,
        input: &NewCheckoutOrder,
        user_id: DbId,
        base_slug: &str,
    ) -> Result<Workspace, sqlx::Error> {
        if let Some(id) = input.workspace_id {
            let member_of = WorkspaceRepo::find_for_member(&mut *conn, id, user_id).await?;
            if let Some(workspace) = member_of {
                return Ok(workspace);
            }
            tracing::warn!(
                workspace_id = id,
                user_id,
                "Checkout named a workspace the buyer does not belong to"
            );
        }

        let candidates = (1..=WORKSPACE_SLUG_ATTEMPTS)
            .map(|n| match n {
                1 => base_slug.to_string(),
                n => suffixed_slug(base_slug, &n.to_string()),
            })
            .chain(std::iter::once(suffixed_slug(base_slug, &input.session_id)));

        for slug in candidates {
            let workspace = WorkspaceRepo::upsert_by_slug(
                &mut *conn,
                &NewWorkspace {
                    slug,
                    name: input.workspace_name.clone(),
                    owner_id: user_id,
                    billing_customer_id: input.billing_customer_id.clone(),
                },
            )
            .await?;

            if workspace.owner_id == user_id {
                WorkspaceMemberRepo::add(&mut *conn, workspace.id, user_id, WORKSPACE_ROLE_OWNER)
                    .await?;
                return Ok(workspace);
            }
            if WorkspaceMemberRepo::is_member(&mut *conn, workspace.id, user_id).await? {
                return Ok(workspace);
            }
        }

        Err(sqlx::Error::Protocol(
            "could not allocate a unique workspace slug".to_string(),
        ))
    }

    /// Apply a status change to an order.
    pub async fn apply_status_change<'e, E>(
        executor: E,
        id: DbId,
        change: &StatusChange,
    ) -> Result<Order, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE orders SET status = $2, fulfilled_at = COALESCE($3, fulfilled_at) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(change.status.as_str())
            .bind(change.fulfilled_at)
            .fetch_one(executor)
            .await
    }

    /// Apply a status change only if the order is still in `expected`.
    ///
    /// Returns `None` when the order is missing or its status changed since
    /// it was read.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected: OrderStatus,
        change: &StatusChange,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = $3, fulfilled_at = COALESCE($4, fulfilled_at) \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(change.status.as_str())
            .bind(change.fulfilled_at)
            .fetch_optional(pool)
            .await
    }
}
