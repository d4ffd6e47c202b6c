use sqlx::{sqlite::SqliteRow, Row};

use burgeria_core::domain::product::{BundleComponent, Product, ProductId, ProductKind};

use super::{parse_u32, BundleSlot, CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, kind, price, description, stock_quantity, embedding
             FROM product
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(product_from_row).transpose()
    }

    async fn list_in_stock(
        &self,
        kind: Option<ProductKind>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = if let Some(kind) = kind {
            sqlx::query(
                "SELECT id, name, kind, price, description, stock_quantity, embedding
                 FROM product
                 WHERE stock_quantity > 0 AND kind = ?
                 ORDER BY id ASC",
            )
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT id, name, kind, price, description, stock_quantity, embedding
                 FROM product
                 WHERE stock_quantity > 0
                 ORDER BY id ASC",
            )
            .fetch_all(&self.pool)
            .await?
        };

        rows.into_iter().map(product_from_row).collect()
    }

    async fn bundle_defaults(
        &self,
        bundle_id: &ProductId,
    ) -> Result<Vec<BundleSlot>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                bc.bundle_id,
                bc.quantity AS component_quantity,
                bc.is_default,
                p.id, p.name, p.kind, p.price, p.description, p.stock_quantity, p.embedding
             FROM bundle_component bc
             JOIN product p ON p.id = bc.product_id
             WHERE bc.bundle_id = ? AND bc.is_default = 1
             ORDER BY p.id ASC",
        )
        .bind(&bundle_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let product = product_from_row_prefixless(&row)?;
                let component = BundleComponent {
                    bundle_id: ProductId(row.try_get("bundle_id")?),
                    product_id: product.id.clone(),
                    quantity: parse_u32("component_quantity", row.try_get("component_quantity")?)?,
                    is_default: row.try_get::<i64, _>("is_default")? != 0,
                };
                Ok(BundleSlot { component, product })
            })
            .collect()
    }

    async fn options_for_kind(&self, kind: ProductKind) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, kind, price, description, stock_quantity, embedding
             FROM product
             WHERE kind = ? AND stock_quantity > 0
             ORDER BY price ASC, id ASC",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(product_from_row).collect()
    }
}

fn product_from_row(row: SqliteRow) -> Result<Product, RepositoryError> {
    product_from_row_prefixless(&row)
}

fn product_from_row_prefixless(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let kind_raw = row.try_get::<String, _>("kind")?;
    let kind = ProductKind::parse(&kind_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown product kind `{kind_raw}`")))?;

    let embedding = row
        .try_get::<Option<String>, _>("embedding")?
        .map(|raw| {
            serde_json::from_str::<Vec<f32>>(&raw).map_err(|error| {
                RepositoryError::Decode(format!("invalid embedding payload: {error}"))
            })
        })
        .transpose()?;

    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        kind,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        stock_quantity: parse_u32("stock_quantity", row.try_get("stock_quantity")?)?,
        embedding,
    })
}
