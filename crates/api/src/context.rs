//! Per-request context passed explicitly into handlers and outbound calls.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::state::AppState;

/// Header carrying the request id (set by `SetRequestIdLayer`).
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id and deadline of the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// Instant after which the server-side timeout fires; outbound calls
    /// must finish before it.
    pub deadline: Instant,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: Instant::now() + timeout,
        }
    }

    /// Time left before the deadline (zero once it has passed).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        Ok(RequestContext::new(
            request_id,
            Duration::from_secs(state.config.request_timeout_secs),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_is_bounded_by_timeout() {
        let ctx = RequestContext::new("req-1", Duration::from_secs(5));
        assert!(ctx.remaining() <= Duration::from_secs(5));
        assert!(ctx.remaining() > Duration::from_secs(4));
    }

    #[test]
    fn expired_deadline_leaves_nothing() {
        let ctx = RequestContext::new("req-1", Duration::ZERO);
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }
}
