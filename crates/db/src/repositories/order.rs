use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use burgeria_core::domain::cart::{BundleGroupId, LineKind, SessionId};
use burgeria_core::domain::modification::{Modification, ModificationKind};
use burgeria_core::domain::order::{FulfillmentType, Order, OrderId, OrderLine, OrderLineId, OrderStatus};
use burgeria_core::domain::product::ProductId;

use super::{parse_timestamp, parse_u32, OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn create_with_lines(
        &self,
        order: &Order,
        lines: &[OrderLine],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (
                id, session_id, sequence_number, customer_name, customer_phone,
                fulfillment_type, status, total_amount, estimated_minutes, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id.0)
        .bind(&order.session_id.0)
        .bind(i64::from(order.sequence_number))
        .bind(order.customer_name.as_deref())
        .bind(order.customer_phone.as_deref())
        .bind(order.fulfillment_type.as_str())
        .bind(order.status.as_str())
        .bind(order.total_amount)
        .bind(i64::from(order.estimated_minutes))
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO order_line (
                    id, order_id, product_id, display_name, line_kind,
                    quantity, unit_base_price, line_total, notes, bundle_group_id
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&line.id.0)
            .bind(&line.order_id.0)
            .bind(&line.product_id.0)
            .bind(&line.display_name)
            .bind(line.line_kind.as_str())
            .bind(i64::from(line.quantity))
            .bind(line.unit_base_price)
            .bind(line.line_total)
            .bind(&line.notes)
            .bind(line.bundle_group_id.as_ref().map(|group| group.0.as_str()))
            .execute(&mut *tx)
            .await?;

            for modification in &line.modifications {
                sqlx::query(
                    "INSERT INTO order_line_modification (
                        order_line_id, kind, from_product_id, to_product_id, description, price_delta
                     ) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&line.id.0)
                .bind(modification.kind.as_str())
                .bind(modification.from_product_id.as_ref().map(|id| id.0.as_str()))
                .bind(modification.to_product_id.as_ref().map(|id| id.0.as_str()))
                .bind(&modification.description)
                .bind(modification.price_delta)
                .execute(&mut *tx)
                .await?;
            }
        }

        // The cart empties in the same transaction as the snapshot; a partial
        // finalize is never visible.
        sqlx::query("DELETE FROM cart_line WHERE session_id = ?")
            .bind(&order.session_id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn count_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM orders WHERE created_at >= ? AND created_at < ?",
        )
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        parse_u32("count", row.try_get("count")?)
    }

    async fn find_by_id(
        &self,
        id: &OrderId,
    ) -> Result<Option<(Order, Vec<OrderLine>)>, RepositoryError> {
        let header = sqlx::query(
            "SELECT id, session_id, sequence_number, customer_name, customer_phone,
                    fulfillment_type, status, total_amount, estimated_minutes, created_at
             FROM orders
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else { return Ok(None) };
        let order = order_from_row(header)?;

        let line_rows = sqlx::query(
            "SELECT id, order_id, product_id, display_name, line_kind,
                    quantity, unit_base_price, line_total, notes, bundle_group_id
             FROM order_line
             WHERE order_id = ?
             ORDER BY bundle_group_id, id",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        let modification_rows = sqlx::query(
            "SELECT m.order_line_id, m.kind, m.from_product_id, m.to_product_id,
                    m.description, m.price_delta
             FROM order_line_modification m
             JOIN order_line l ON l.id = m.order_line_id
             WHERE l.order_id = ?
             ORDER BY m.id ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut modifications: HashMap<String, Vec<Modification>> = HashMap::new();
        for row in modification_rows {
            let line_id = row.try_get::<String, _>("order_line_id")?;
            modifications.entry(line_id).or_default().push(order_modification_from_row(&row)?);
        }

        let lines = line_rows
            .into_iter()
            .map(|row| {
                let mods =
                    modifications.remove(&row.try_get::<String, _>("id")?).unwrap_or_default();
                order_line_from_row(row, mods)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some((order, lines)))
    }
}

fn order_from_row(row: SqliteRow) -> Result<Order, RepositoryError> {
    let fulfillment_raw = row.try_get::<String, _>("fulfillment_type")?;
    let fulfillment_type = FulfillmentType::parse(&fulfillment_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown fulfillment type `{fulfillment_raw}`"))
    })?;

    let status_raw = row.try_get::<String, _>("status")?;
    let status = OrderStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown order status `{status_raw}`")))?;

    Ok(Order {
        id: OrderId(row.try_get("id")?),
        session_id: SessionId(row.try_get("session_id")?),
        sequence_number: parse_u32("sequence_number", row.try_get("sequence_number")?)?,
        customer_name: row.try_get("customer_name")?,
        customer_phone: row.try_get("customer_phone")?,
        fulfillment_type,
        status,
        total_amount: row.try_get("total_amount")?,
        estimated_minutes: parse_u32("estimated_minutes", row.try_get("estimated_minutes")?)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn order_line_from_row(
    row: SqliteRow,
    modifications: Vec<Modification>,
) -> Result<OrderLine, RepositoryError> {
    let kind_raw = row.try_get::<String, _>("line_kind")?;
    let line_kind = LineKind::parse(&kind_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown line kind `{kind_raw}`")))?;

    Ok(OrderLine {
        id: OrderLineId(row.try_get("id")?),
        order_id: OrderId(row.try_get("order_id")?),
        product_id: ProductId(row.try_get("product_id")?),
        display_name: row.try_get("display_name")?,
        line_kind,
        quantity: parse_u32("quantity", row.try_get("quantity")?)?,
        unit_base_price: row.try_get("unit_base_price")?,
        modifications,
        line_total: row.try_get("line_total")?,
        notes: row.try_get("notes")?,
        bundle_group_id: row.try_get::<Option<String>, _>("bundle_group_id")?.map(BundleGroupId),
    })
}

fn order_modification_from_row(row: &SqliteRow) -> Result<Modification, RepositoryError> {
    let kind_raw = row.try_get::<String, _>("kind")?;
    let kind = ModificationKind::parse(&kind_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown modification kind `{kind_raw}`")))?;

    Ok(Modification {
        kind,
        from_product_id: row.try_get::<Option<String>, _>("from_product_id")?.map(ProductId),
        to_product_id: row.try_get::<Option<String>, _>("to_product_id")?.map(ProductId),
        description: row.try_get("description")?,
        price_delta: row.try_get("price_delta")?,
    })
}
