//! Orders as seen by the client.
//!
//! The backend owns orders; the client only reads them and requests status
//! transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MenuItemId, OrderId, OrderStatus, OrderType, Price, UserId};

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub unit_price: Price,
}

/// An order and its current lifecycle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Identity that placed the order.
    pub customer_id: UserId,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
    /// Kitchen estimate, in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
}

impl Order {
    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items
            .iter()
            .map(|line| line.unit_price.times(line.quantity))
            .sum()
    }

    /// Whether `user` placed this order.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.customer_id == user
    }
}
