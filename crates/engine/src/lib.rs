//! Product resolution and order composition engine.
//!
//! The facade wires the catalog-backed search, bundle expansion, cart ledger,
//! and order finalization services over one connection pool. Every operation
//! returns a typed outcome; disambiguation is always pushed back to the
//! caller.

use std::sync::Arc;

use burgeria_core::config::EngineConfig;
use burgeria_core::domain::cart::{BundleGroupId, CartLineId, SessionId};
use burgeria_core::domain::order::{FulfillmentType, Order, OrderId, OrderLine};
use burgeria_core::domain::product::{ProductId, ProductKind};
use burgeria_core::embedding::Embedder;
use burgeria_core::errors::EngineError;
use burgeria_core::resolver::Resolution;
use burgeria_db::{DbPool, SqlCartRepository, SqlCatalogRepository, SqlOrderRepository};

pub mod bundle;
pub mod cart;
pub mod openai;
pub mod order;
pub mod search;

pub use bundle::{BundleExpander, BundleOptions, CategoryOptions, ComponentOption};
pub use cart::{
    AddToCartReceipt, CartService, CartView, ClearReceipt, ClearTarget, GroupCandidate,
    ModificationRequest, ReplaceOutcome, UpdateOutcome,
};
pub use openai::OpenAiEmbedder;
pub use order::{CustomerInfo, OrderReceipt, OrderService};
pub use search::ProductSearch;

pub struct Engine {
    search: ProductSearch,
    bundles: BundleExpander,
    cart: CartService,
    orders: OrderService,
}

impl Engine {
    pub fn new(pool: DbPool, config: &EngineConfig, embedder: Arc<dyn Embedder>) -> Self {
        let catalog = Arc::new(SqlCatalogRepository::new(pool.clone()));
        let cart_repo = Arc::new(SqlCartRepository::new(pool.clone()));
        let order_repo = Arc::new(SqlOrderRepository::new(pool));

        Self {
            search: ProductSearch::new(catalog.clone(), embedder, config.resolver),
            bundles: BundleExpander::new(catalog.clone()),
            cart: CartService::new(catalog, cart_repo.clone(), config.pricing),
            orders: OrderService::new(cart_repo, order_repo, config.orders),
        }
    }

    pub async fn find_product(
        &self,
        query: &str,
        category: Option<ProductKind>,
        limit: Option<usize>,
    ) -> Result<Resolution, EngineError> {
        self.search.find_product(query, category, limit).await
    }

    pub async fn get_bundle_options(
        &self,
        bundle_id: &ProductId,
    ) -> Result<BundleOptions, EngineError> {
        self.bundles.options(bundle_id).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_to_cart(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: u32,
        is_bundle: bool,
        modifications: &[ModificationRequest],
        notes: Option<&str>,
    ) -> Result<AddToCartReceipt, EngineError> {
        self.cart
            .add_to_cart(session_id, product_id, quantity, is_bundle, modifications, notes)
            .await
    }

    pub async fn get_cart(&self, session_id: &SessionId) -> Result<CartView, EngineError> {
        self.cart.get_cart(session_id).await
    }

    pub async fn update_cart_line(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
        new_quantity: u32,
    ) -> Result<UpdateOutcome, EngineError> {
        self.cart.update_quantity(session_id, line_id, new_quantity).await
    }

    pub async fn clear_cart(
        &self,
        session_id: &SessionId,
        target: ClearTarget,
    ) -> Result<ClearReceipt, EngineError> {
        self.cart.clear(session_id, target).await
    }

    pub async fn replace_component(
        &self,
        session_id: &SessionId,
        old_product_id: &ProductId,
        new_product_id: &ProductId,
        bundle_group_id: Option<&BundleGroupId>,
    ) -> Result<ReplaceOutcome, EngineError> {
        self.cart
            .replace_component(session_id, old_product_id, new_product_id, bundle_group_id)
            .await
    }

    pub async fn finalize_order(
        &self,
        session_id: &SessionId,
        customer: CustomerInfo,
        fulfillment_type: FulfillmentType,
    ) -> Result<OrderReceipt, EngineError> {
        self.orders.finalize(session_id, customer, fulfillment_type).await
    }

    pub async fn get_order(
        &self,
        order_id: &OrderId,
    ) -> Result<(Order, Vec<OrderLine>), EngineError> {
        self.orders.get_order(order_id).await
    }
}
