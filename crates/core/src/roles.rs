//! Well-known role name constants.
//!
//! Platform roles travel in the session token's `role` claim; workspace
//! roles are stored in `workspace_members.role` and must match the CHECK
//! constraint in `20261019000002_create_workspaces.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

pub const WORKSPACE_ROLE_OWNER: &str = "owner";
pub const WORKSPACE_ROLE_MEMBER: &str = "member";
