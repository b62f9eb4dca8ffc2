pub mod client;
pub mod domain;
pub mod inbox;
pub mod onboarding;
pub mod order;
pub mod user;
pub mod workspace;
