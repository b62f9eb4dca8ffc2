//! Order entity model and DTOs.

use mailroom_core::order::OrderStatus;
use mailroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::client::Client;
use crate::models::onboarding::OnboardingData;
use crate::models::workspace::Workspace;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: DbId,
    pub order_number: String,
    /// Payment-processor checkout session id; the sole link between the
    /// payment flow and onboarding.
    pub session_id: String,
    pub workspace_id: DbId,
    pub client_id: DbId,
    pub total_cents: i64,
    pub currency: String,
    pub quantity: i32,
    pub inbox_count: i32,
    pub domain_count: i32,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub fulfilled_at: Option<Timestamp>,
}

/// Everything needed to record a completed checkout.
#[derive(Debug, Clone)]
pub struct NewCheckoutOrder {
    pub session_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    /// Workspace the purchase was made for. Only used when the buyer
    /// already belongs to it.
    pub workspace_id: Option<DbId>,
    pub workspace_name: String,
    pub quantity: i32,
    pub total_cents: i64,
    pub currency: String,
    pub billing_customer_id: Option<String>,
}

/// Result of [`crate::repositories::OrderRepo::create_from_checkout`].
#[derive(Debug, Clone)]
pub struct CheckoutOrderOutcome {
    pub order: Order,
    /// `false` when an order already existed for the session id.
    pub created: bool,
}

/// Request body for the administrative status update.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

/// Query parameters for listing orders.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub workspace_id: Option<DbId>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// An order with its related rows, as returned by `GET /orders/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub workspace: Option<Workspace>,
    pub client: Option<Client>,
    pub onboarding_data: Option<OnboardingData>,
}
