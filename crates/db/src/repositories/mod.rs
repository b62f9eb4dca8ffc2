//! Repository layer: one unit struct per table, all methods `async` and
//! returning `sqlx::Error` for the caller to classify.
//!
//! Methods that take a generic `PgExecutor` are meant to be composed inside
//! a transaction (`&mut *tx`) as well as called on the pool directly.

pub mod client_repo;
pub mod domain_repo;
pub mod inbox_repo;
pub mod onboarding_repo;
pub mod order_repo;
pub mod user_repo;
pub mod workspace_repo;

pub use client_repo::ClientRepo;
pub use domain_repo::DomainRepo;
pub use inbox_repo::InboxRepo;
pub use onboarding_repo::OnboardingRepo;
pub use order_repo::OrderRepo;
pub use user_repo::UserRepo;
pub use workspace_repo::{WorkspaceMemberRepo, WorkspaceRepo};

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 200;

/// Clamp a requested page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_LIMIT);
        assert_eq!(clamp_offset(Some(-3)), 0);
    }
}
