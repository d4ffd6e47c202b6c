use std::collections::HashMap;

use sqlx::{sqlite::SqliteRow, Row};

use burgeria_core::domain::cart::{BundleGroupId, CartLine, CartLineId, LineKind, SessionId};
use burgeria_core::domain::modification::{Modification, ModificationKind};
use burgeria_core::domain::product::ProductId;

use super::{parse_timestamp, parse_u32, CartRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCartRepository {
    pool: DbPool,
}

impl SqlCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CartRepository for SqlCartRepository {
    async fn insert_lines(&self, lines: &[CartLine]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO cart_line (
                    id, session_id, product_id, display_name, line_kind,
                    quantity, unit_base_price, notes, bundle_group_id, created_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&line.id.0)
            .bind(&line.session_id.0)
            .bind(&line.product_id.0)
            .bind(&line.display_name)
            .bind(line.line_kind.as_str())
            .bind(i64::from(line.quantity))
            .bind(line.unit_base_price)
            .bind(&line.notes)
            .bind(line.bundle_group_id.as_ref().map(|group| group.0.as_str()))
            .bind(line.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

            for modification in &line.modifications {
                insert_modification(&mut tx, &line.id, modification).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn lines_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let line_rows = sqlx::query(
            "SELECT id, session_id, product_id, display_name, line_kind,
                    quantity, unit_base_price, notes, bundle_group_id, created_at
             FROM cart_line
             WHERE session_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(&session_id.0)
        .fetch_all(&self.pool)
        .await?;

        let modification_rows = sqlx::query(
            "SELECT m.cart_line_id, m.kind, m.from_product_id, m.to_product_id,
                    m.description, m.price_delta
             FROM cart_line_modification m
             JOIN cart_line l ON l.id = m.cart_line_id
             WHERE l.session_id = ?
             ORDER BY m.id ASC",
        )
        .bind(&session_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut modifications: HashMap<String, Vec<Modification>> = HashMap::new();
        for row in modification_rows {
            let line_id = row.try_get::<String, _>("cart_line_id")?;
            modifications.entry(line_id).or_default().push(modification_from_row(&row)?);
        }

        line_rows
            .into_iter()
            .map(|row| {
                let mods = modifications
                    .remove(&row.try_get::<String, _>("id")?)
                    .unwrap_or_default();
                line_from_row(row, mods)
            })
            .collect()
    }

    async fn find_line(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, session_id, product_id, display_name, line_kind,
                    quantity, unit_base_price, notes, bundle_group_id, created_at
             FROM cart_line
             WHERE session_id = ? AND id = ?",
        )
        .bind(&session_id.0)
        .bind(&line_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let modification_rows = sqlx::query(
            "SELECT cart_line_id, kind, from_product_id, to_product_id, description, price_delta
             FROM cart_line_modification
             WHERE cart_line_id = ?
             ORDER BY id ASC",
        )
        .bind(&line_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mods = modification_rows
            .iter()
            .map(modification_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        line_from_row(row, mods).map(Some)
    }

    async fn update_quantity(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_line SET quantity = ? WHERE id = ? AND session_id = ?",
        )
        .bind(i64::from(quantity))
        .bind(&line_id.0)
        .bind(&session_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_line(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_line WHERE id = ? AND session_id = ?")
            .bind(&line_id.0)
            .bind(&session_id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn clear_session(&self, session_id: &SessionId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_line WHERE session_id = ?")
            .bind(&session_id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_for_session(&self, session_id: &SessionId) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM cart_line WHERE session_id = ?")
            .bind(&session_id.0)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<i64, _>("count")? as u64)
    }

    async fn replace_line_product(
        &self,
        line_id: &CartLineId,
        product_id: &ProductId,
        display_name: &str,
        modifications: &[Modification],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE cart_line SET product_id = ?, display_name = ? WHERE id = ?")
            .bind(&product_id.0)
            .bind(display_name)
            .bind(&line_id.0)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM cart_line_modification WHERE cart_line_id = ?")
            .bind(&line_id.0)
            .execute(&mut *tx)
            .await?;

        for modification in modifications {
            insert_modification(&mut tx, line_id, modification).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_modification(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    line_id: &CartLineId,
    modification: &Modification,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO cart_line_modification (
            cart_line_id, kind, from_product_id, to_product_id, description, price_delta
         ) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&line_id.0)
    .bind(modification.kind.as_str())
    .bind(modification.from_product_id.as_ref().map(|id| id.0.as_str()))
    .bind(modification.to_product_id.as_ref().map(|id| id.0.as_str()))
    .bind(&modification.description)
    .bind(modification.price_delta)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn modification_from_row(row: &SqliteRow) -> Result<Modification, RepositoryError> {
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

fn line_from_row(row: SqliteRow, modifications: Vec<Modification>) -> Result<CartLine, RepositoryError> {
    let kind_raw = row.try_get::<String, _>("line_kind")?;
    let line_kind = LineKind::parse(&kind_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown line kind `{kind_raw}`")))?;

    Ok(CartLine {
        id: CartLineId(row.try_get("id")?),
        session_id: SessionId(row.try_get("session_id")?),
        product_id: ProductId(row.try_get("product_id")?),
        display_name: row.try_get("display_name")?,
        line_kind,
        quantity: parse_u32("quantity", row.try_get("quantity")?)?,
        unit_base_price: row.try_get("unit_base_price")?,
        modifications,
        notes: row.try_get("notes")?,
        bundle_group_id: row.try_get::<Option<String>, _>("bundle_group_id")?.map(BundleGroupId),
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
