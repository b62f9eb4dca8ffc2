//! Order lifecycle: status values, the transition table, and the
//! quantities derived from a purchase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Prefix of every persisted order number (`ORD-<epoch-millis>`).
pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Upper bound on domains provisioned for a single purchase.
pub const MAX_DOMAINS_PER_ORDER: i32 = 3;

/// Product identifier recorded on a client when they buy inboxes.
pub const PRODUCT_EMAIL_INBOXES: &str = "email_inboxes";

/// Lifecycle status of an order. Stored as upper-case text in
/// `orders.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Pending,
    Delivered,
    Completed,
    Cancelled,
}

/// Statuses an operator may set through the administrative endpoint.
pub const ADMIN_TARGET_STATUSES: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether `next` is reachable from `self`.
    ///
    /// | from      | allowed targets                           |
    /// |-----------|-------------------------------------------|
    /// | PLACED    | PENDING, DELIVERED, COMPLETED, CANCELLED  |
    /// | PENDING   | DELIVERED, COMPLETED, CANCELLED           |
    /// | COMPLETED | PENDING, DELIVERED, CANCELLED             |
    /// | DELIVERED | CANCELLED                                 |
    /// | CANCELLED | (none)                                    |
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Placed, Pending | Delivered | Completed | Cancelled)
                | (Pending, Delivered | Completed | Cancelled)
                | (Completed, Pending | Delivered | Cancelled)
                | (Delivered, Cancelled)
        )
    }

    /// Whether reaching this status stamps the order's fulfillment time.
    pub fn stamps_fulfillment(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLACED" => Ok(OrderStatus::Placed),
            "PENDING" => Ok(OrderStatus::Pending),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown order status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parse the `status` field of an administrative update.
///
/// Only PENDING, DELIVERED and CANCELLED are accepted; anything else,
/// including a missing value, is a validation error.
pub fn parse_admin_target(status: Option<&str>) -> Result<OrderStatus, CoreError> {
    let raw = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Validation("status is required".into()))?;

    match raw.parse::<OrderStatus>() {
        Ok(s) if ADMIN_TARGET_STATUSES.contains(&s) => Ok(s),
        _ => Err(CoreError::Validation(format!(
            "Invalid status '{raw}'. Must be one of: PENDING, DELIVERED, CANCELLED"
        ))),
    }
}

/// The write produced by an administrative status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: OrderStatus,
    /// `Some` when the new status stamps the fulfillment time.
    pub fulfilled_at: Option<Timestamp>,
}

/// Decide the write for moving an order from `current` to `target`.
///
/// Setting the status an order already has is a no-op (`Ok(None)`).
pub fn plan_status_change(
    current: OrderStatus,
    target: OrderStatus,
    now: Timestamp,
) -> Result<Option<StatusChange>, CoreError> {
    if current == target {
        return Ok(None);
    }
    if !current.can_transition_to(target) {
        return Err(CoreError::Conflict(format!(
            "Order cannot move from {current} to {target}"
        )));
    }
    Ok(Some(StatusChange {
        status: target,
        fulfilled_at: target.stamps_fulfillment().then_some(now),
    }))
}

/// Build an order number from a creation time.
pub fn order_number(now: Timestamp) -> String {
    format!("{ORDER_NUMBER_PREFIX}{}", now.timestamp_millis())
}

/// Inbox and domain counts provisioned for a purchased quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisioning {
    pub inbox_count: i32,
    pub domain_count: i32,
}

/// One inbox per unit, one domain per unit up to [`MAX_DOMAINS_PER_ORDER`].
pub fn provisioning_for(quantity: i32) -> Provisioning {
    Provisioning {
        inbox_count: quantity,
        domain_count: quantity.min(MAX_DOMAINS_PER_ORDER),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn ts() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn status_text_round_trips() {
        for s in [
            OrderStatus::Placed,
            OrderStatus::Pending,
            OrderStatus::Delivered,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), s);
        }
        assert!("placed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"DELIVERED\"");
    }

    #[test]
    fn admin_target_accepts_only_three_values() {
        assert_eq!(parse_admin_target(Some("PENDING")).unwrap(), OrderStatus::Pending);
        assert_eq!(parse_admin_target(Some("DELIVERED")).unwrap(), OrderStatus::Delivered);
        assert_eq!(parse_admin_target(Some("CANCELLED")).unwrap(), OrderStatus::Cancelled);

        for bad in ["COMPLETED", "PLACED", "delivered", "SHIPPED"] {
            assert_matches!(parse_admin_target(Some(bad)), Err(CoreError::Validation(_)));
        }
        assert_matches!(parse_admin_target(None), Err(CoreError::Validation(_)));
        assert_matches!(parse_admin_target(Some("  ")), Err(CoreError::Validation(_)));
    }

    #[test]
    fn delivered_always_stamps_fulfillment() {
        for from in [OrderStatus::Placed, OrderStatus::Pending, OrderStatus::Completed] {
            let change = plan_status_change(from, OrderStatus::Delivered, ts())
                .unwrap()
                .unwrap();
            assert_eq!(change.fulfilled_at, Some(ts()));
        }
    }

    #[test]
    fn pending_and_cancelled_do_not_stamp() {
        let change = plan_status_change(OrderStatus::Placed, OrderStatus::Pending, ts())
            .unwrap()
            .unwrap();
        assert_eq!(change.fulfilled_at, None);

        let change = plan_status_change(OrderStatus::Delivered, OrderStatus::Cancelled, ts())
            .unwrap()
            .unwrap();
        assert_eq!(change.fulfilled_at, None);
    }

    #[test]
    fn cancelled_is_terminal() {
        for target in ADMIN_TARGET_STATUSES {
            if *target == OrderStatus::Cancelled {
                continue;
            }
            assert_matches!(
                plan_status_change(OrderStatus::Cancelled, *target, ts()),
                Err(CoreError::Conflict(_))
            );
        }
    }

    #[test]
    fn delivered_cannot_regress_to_pending() {
        assert_matches!(
            plan_status_change(OrderStatus::Delivered, OrderStatus::Pending, ts()),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn same_status_is_a_no_op() {
        assert_eq!(
            plan_status_change(OrderStatus::Pending, OrderStatus::Pending, ts()).unwrap(),
            None
        );
    }

    #[test]
    fn order_number_uses_epoch_millis() {
        assert_eq!(order_number(ts()), format!("ORD-{}", ts().timestamp_millis()));
    }

    #[test]
    fn domains_are_capped_at_three() {
        assert_eq!(provisioning_for(1), Provisioning { inbox_count: 1, domain_count: 1 });
        assert_eq!(provisioning_for(3), Provisioning { inbox_count: 3, domain_count: 3 });
        assert_eq!(provisioning_for(40), Provisioning { inbox_count: 40, domain_count: 3 });
    }
}
