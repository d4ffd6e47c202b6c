use thiserror::Error;

use crate::domain::cart::{CartLineId, SessionId};
use crate::domain::order::{OrderId, OrderStatus};
use crate::domain::product::{ProductId, ProductKind};

/// Typed outcome surface for every engine operation. None of these are
/// retried internally; each carries enough structure for the caller to decide
/// the next action. An ambiguous bundle-group target is a required-choice
/// signal, not an error, and is modeled on the operation result instead.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("product `{0}` not found")]
    ProductNotFound(ProductId),
    #[error("cart line `{0}` not found")]
    LineNotFound(CartLineId),
    #[error("order `{0}` not found")]
    OrderNotFound(OrderId),
    #[error("`{name}` has insufficient stock: requested {requested}, available {available}")]
    OutOfStock { product_id: ProductId, name: String, requested: u32, available: u32 },
    #[error("product `{0}` is not a bundle")]
    NotABundle(ProductId),
    #[error("cannot swap a {expected} component for a {found} product")]
    CategoryMismatch { expected: ProductKind, found: ProductKind },
    #[error("cart for session `{0}` is empty")]
    EmptyCart(SessionId),
    #[error("invalid order transition from {from} to {to}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },
    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{ProductId, ProductKind};

    use super::EngineError;

    #[test]
    fn errors_render_with_relevant_identifiers() {
        let error = EngineError::OutOfStock {
            product_id: ProductId("B00001".to_string()),
            name: "Potato".to_string(),
            requested: 3,
            available: 1,
        };
        assert_eq!(
            error.to_string(),
            "`Potato` has insufficient stock: requested 3, available 1"
        );

        let mismatch =
            EngineError::CategoryMismatch { expected: ProductKind::Sides, found: ProductKind::Beverage };
        assert_eq!(mismatch.to_string(), "cannot swap a sides component for a beverage product");
    }
}
