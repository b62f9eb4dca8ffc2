//! Request middleware and authentication extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a session token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rate_limit::rate_limit`] -- Fixed-window limiter keyed by client IP and path.
//! - [`session_gate::session_gate`] -- Rejects unauthenticated requests to
//!   protected path prefixes.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
pub mod session_gate;
