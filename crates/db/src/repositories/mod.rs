use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use burgeria_core::domain::cart::{CartLine, CartLineId, SessionId};
use burgeria_core::domain::modification::Modification;
use burgeria_core::domain::order::{Order, OrderId, OrderLine};
use burgeria_core::domain::product::{BundleComponent, Product, ProductId, ProductKind};
use burgeria_core::errors::EngineError;

pub mod cart;
pub mod catalog;
pub mod order;

pub use cart::SqlCartRepository;
pub use catalog::SqlCatalogRepository;
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for EngineError {
    fn from(value: RepositoryError) -> Self {
        EngineError::Storage(value.to_string())
    }
}

/// A bundle's default slot: the component row joined to the live product.
#[derive(Clone, Debug, PartialEq)]
pub struct BundleSlot {
    pub component: BundleComponent,
    pub product: Product,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// In-stock products, optionally filtered by category, in stable catalog
    /// order (primary key).
    async fn list_in_stock(
        &self,
        kind: Option<ProductKind>,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Default components of a bundle, joined to live product rows.
    async fn bundle_defaults(&self, bundle_id: &ProductId)
        -> Result<Vec<BundleSlot>, RepositoryError>;

    /// In-stock swap candidates for one category, price ascending, ties by id.
    async fn options_for_kind(&self, kind: ProductKind) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Insert a batch of lines (with their modifications) atomically. A
    /// bundle purchase lands as one call so either every component line is
    /// visible or none are.
    async fn insert_lines(&self, lines: &[CartLine]) -> Result<(), RepositoryError>;

    /// Session lines in insertion order, modifications attached.
    async fn lines_for_session(&self, session_id: &SessionId)
        -> Result<Vec<CartLine>, RepositoryError>;

    async fn find_line(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Returns false when the line does not belong to the session.
    async fn update_quantity(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<bool, RepositoryError>;

    /// Removes one line; returns the number of rows removed (0 or 1).
    async fn delete_line(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
    ) -> Result<u64, RepositoryError>;

    async fn clear_session(&self, session_id: &SessionId) -> Result<u64, RepositoryError>;

    async fn count_for_session(&self, session_id: &SessionId) -> Result<u64, RepositoryError>;

    /// Rewrite one line's product and replace its modification set in a
    /// single transaction.
    async fn replace_line_product(
        &self,
        line_id: &CartLineId,
        product_id: &ProductId,
        display_name: &str,
        modifications: &[Modification],
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomic finalize: order header + every line + modifications are
    /// written and the session's cart lines deleted in one transaction.
    async fn create_with_lines(
        &self,
        order: &Order,
        lines: &[OrderLine],
    ) -> Result<(), RepositoryError>;

    /// Orders created in `[start, end)`, for same-day sequence numbering.
    async fn count_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, RepositoryError>;

    async fn find_by_id(
        &self,
        id: &OrderId,
    ) -> Result<Option<(Order, Vec<OrderLine>)>, RepositoryError>;
}

pub(crate) fn parse_u32(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
