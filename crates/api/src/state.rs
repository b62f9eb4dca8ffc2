use std::sync::Arc;

use mailroom_core::rate_limit::RateLimiter;

use crate::billing::PaymentGateway;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mailroom_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound payment processor.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Per-instance request counters.
    pub rate_limiter: Arc<RateLimiter>,
}
