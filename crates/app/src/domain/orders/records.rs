//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{domain::catalog::records::ItemRef, identity::UserUuid, uuids::TypedUuid};

/// Order marker.
#[derive(Debug)]
pub struct Order;

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order item marker.
#[derive(Debug)]
pub struct OrderItem;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItem>;

/// Lifecycle of an order. Transitions only move forward:
/// `pending -> completed | payment_failed | refunded` and `completed -> refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    PaymentFailed,
    Refunded,
}

#[derive(Debug, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(String);

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::PaymentFailed => "payment_failed",
            Self::Refunded => "refunded",
        }
    }

    /// Statuses an order may be in immediately before moving to `self`.
    #[must_use]
    pub const fn allowed_sources(self) -> &'static [Self] {
        match self {
            Self::Pending => &[],
            Self::Completed | Self::PaymentFailed => &[Self::Pending],
            Self::Refunded => &[Self::Pending, Self::Completed],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next.allowed_sources().contains(&self)
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "payment_failed" => Ok(Self::PaymentFailed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user: Option<UserUuid>,
    pub session_key: Option<String>,
    pub email: String,
    pub subtotal: u64,
    pub tax: u64,
    pub total: u64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub refunded_at: Option<Timestamp>,
}

/// Order Item Record
///
/// Title and price are snapshots taken when the order was created.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub order: OrderUuid,
    pub item: ItemRef,
    pub title: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub subtotal: u64,
    pub created_at: Timestamp,
}

/// New Order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user: Option<UserUuid>,
    pub session_key: Option<String>,
    pub email: String,
    pub subtotal: u64,
    pub tax: u64,
    pub currency: String,
}

/// New Order Item
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub item: ItemRef,
    pub title: String,
    pub unit_price: u64,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use OrderStatus::{Completed, PaymentFailed, Pending, Refunded};

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(PaymentFailed));
        assert!(Pending.can_transition_to(Refunded));
        assert!(Completed.can_transition_to(Refunded));

        assert!(!Completed.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!PaymentFailed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(PaymentFailed));
        assert!(!Refunded.can_transition_to(Pending));
    }

    #[test]
    fn status_round_trips_through_its_column_value() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::PaymentFailed,
            OrderStatus::Refunded,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().ok(), Some(status));
        }
    }
}
