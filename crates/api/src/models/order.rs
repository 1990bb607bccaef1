//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use snaplist_core::{OrderId, OrderStatus, QrCodeId, UserId};

/// A checked-out cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Human-readable number used in emails, e.g. `SL-7KQ2M9XA`.
    pub order_number: String,
    pub status: OrderStatus,
    /// Sum of the quantities copied from the cart.
    pub item_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order, copied from a cart item at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub order_id: OrderId,
    pub qr_code_id: QrCodeId,
    pub product_type: String,
    pub size: Option<String>,
    pub quantity: i32,
}

/// An order with its lines, as shown in order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
