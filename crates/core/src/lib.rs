//! Domain logic for the Mailroom inbox storefront.
//!
//! Everything in this crate is free of I/O: the database and HTTP layers
//! call into it to validate input, derive identifiers, and decide state
//! transitions.

pub mod checkout;
pub mod error;
pub mod onboarding;
pub mod order;
pub mod rate_limit;
pub mod roles;
pub mod slug;
pub mod types;
pub mod validation;
