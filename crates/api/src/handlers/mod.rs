//! Request handlers, one module per resource.

pub mod auth;
pub mod billing;
pub mod checkout;
pub mod intake;
pub mod onboarding;
pub mod orders;
pub mod simulate;
pub mod webhooks;
pub mod workspaces;
