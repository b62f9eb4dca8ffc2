//! Repository for the `users` table.

use mailroom_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, name, created_at, updated_at";

/// Provides lookups and the purchase-time upsert for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user keyed by email, or return the existing row untouched.
    ///
    /// Uses a no-op `DO UPDATE` so `RETURNING` always yields a row; the
    /// stored name is never replaced by a later purchase.
    pub async fn upsert_by_email<'e, E>(
        executor: E,
        email: &str,
        name: Option<&str>,
    ) -> Result<User, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO users (email, name) VALUES ($1, $2) \
             ON CONFLICT (email) DO UPDATE SET email = users.email \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(name)
            .fetch_one(executor)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}
