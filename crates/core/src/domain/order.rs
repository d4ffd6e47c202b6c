use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::cart::{BundleGroupId, LineKind, SessionId};
use crate::domain::modification::Modification;
use crate::domain::product::ProductId;
use crate::errors::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLineId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    Takeout,
    DineIn,
    Delivery,
}

impl FulfillmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentType::Takeout => "takeout",
            FulfillmentType::DineIn => "dine_in",
            FulfillmentType::Delivery => "delivery",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "takeout" => Some(FulfillmentType::Takeout),
            "dine_in" => Some(FulfillmentType::DineIn),
            "delivery" => Some(FulfillmentType::Delivery),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Confirmed, OrderStatus::Preparing)
                | (OrderStatus::Preparing, OrderStatus::Ready)
                | (OrderStatus::Ready, OrderStatus::Completed)
        ) || (!self.is_terminal() && next == OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of a cart at finalize time. The finalizer only ever
/// creates orders in `Pending`; later transitions belong to the kitchen-side
/// collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub session_id: SessionId,
    pub sequence_number: u32,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub fulfillment_type: FulfillmentType,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub estimated_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), EngineError> {
        if self.status.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(EngineError::InvalidOrderTransition { from: self.status, to: next })
    }
}

/// One order line, copied verbatim from its cart line (bundle membership and
/// modifications included).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub display_name: String,
    pub line_kind: LineKind,
    pub quantity: u32,
    pub unit_base_price: i64,
    pub modifications: Vec<Modification>,
    pub line_total: i64,
    pub notes: String,
    pub bundle_group_id: Option<BundleGroupId>,
}
