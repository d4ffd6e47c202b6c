use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use burgeria_core::config::OrderTimingConfig;
use burgeria_core::domain::cart::SessionId;
use burgeria_core::domain::order::{
    FulfillmentType, Order, OrderId, OrderLine, OrderLineId, OrderStatus,
};
use burgeria_core::errors::EngineError;
use burgeria_db::{CartRepository, OrderRepository};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub sequence_number: u32,
    pub total_amount: i64,
    pub line_count: usize,
    pub estimated_minutes: u32,
}

/// Atomically snapshots a non-empty cart into a durable order and empties
/// the cart in the same transaction.
pub struct OrderService {
    cart: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    timing: OrderTimingConfig,
}

impl OrderService {
    pub fn new(
        cart: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        timing: OrderTimingConfig,
    ) -> Self {
        Self { cart, orders, timing }
    }

    pub async fn finalize(
        &self,
        session_id: &SessionId,
        customer: CustomerInfo,
        fulfillment_type: FulfillmentType,
    ) -> Result<OrderReceipt, EngineError> {
        let cart_lines = self.cart.lines_for_session(session_id).await?;
        if cart_lines.is_empty() {
            return Err(EngineError::EmptyCart(session_id.clone()));
        }

        let created_at = Utc::now();
        let (day_start, day_end) = day_bounds(created_at);
        let sequence_number = self.orders.count_created_between(day_start, day_end).await? + 1;
        let order_id =
            OrderId(format!("ORD-{}-{:04}", created_at.format("%Y%m%d"), sequence_number));

        let total_amount = cart_lines.iter().map(|line| line.line_total()).sum();
        let estimated_minutes = self.timing.estimate(cart_lines.len());

        let order = Order {
            id: order_id.clone(),
            session_id: session_id.clone(),
            sequence_number,
            customer_name: customer.name,
            customer_phone: customer.phone,
            fulfillment_type,
            status: OrderStatus::Pending,
            total_amount,
            estimated_minutes,
            created_at,
        };

        let lines: Vec<OrderLine> = cart_lines
            .iter()
            .map(|line| OrderLine {
                id: OrderLineId(Uuid::new_v4().to_string()),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                display_name: line.display_name.clone(),
                line_kind: line.line_kind,
                quantity: line.quantity,
                unit_base_price: line.unit_base_price,
                modifications: line.modifications.clone(),
                line_total: line.line_total(),
                notes: line.notes.clone(),
                bundle_group_id: line.bundle_group_id.clone(),
            })
            .collect();

        self.orders.create_with_lines(&order, &lines).await?;

        tracing::info!(
            event_name = "order.finalized",
            session_id = %session_id,
            order_id = %order_id,
            sequence_number,
            total_amount,
            line_count = lines.len(),
        );

        Ok(OrderReceipt {
            order_id,
            sequence_number,
            total_amount,
            line_count: lines.len(),
            estimated_minutes,
        })
    }

    pub async fn get_order(
        &self,
        order_id: &OrderId,
    ) -> Result<(Order, Vec<OrderLine>), EngineError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| EngineError::OrderNotFound(order_id.clone()))
    }
}

/// `[midnight, next midnight)` in UTC around the given instant; the same-day
/// sequence number counts orders created inside this window.
fn day_bounds(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}
