use std::sync::Arc;

use serde::{Deserialize, Serialize};

use burgeria_core::domain::product::{Product, ProductId, ProductKind};
use burgeria_core::errors::EngineError;
use burgeria_db::{BundleSlot, CatalogRepository};

/// Expands bundle products into their default slots and offers same-category
/// swap candidates for each slot.
pub struct BundleExpander {
    catalog: Arc<dyn CatalogRepository>,
}

/// A bundle joined to its default component slots.
#[derive(Clone, Debug, PartialEq)]
pub struct BundleExpansion {
    pub bundle: Product,
    pub slots: Vec<BundleSlot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BundleOptions {
    pub bundle_id: ProductId,
    pub bundle_name: String,
    pub bundle_price: i64,
    pub components: Vec<ComponentOption>,
    pub swap_candidates: Vec<CategoryOptions>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentOption {
    pub product_id: ProductId,
    pub name: String,
    pub category: ProductKind,
    pub price: i64,
    pub quantity: u32,
}

/// In-stock alternatives for one component category, price ascending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryOptions {
    pub category: ProductKind,
    pub options: Vec<ComponentOption>,
}

impl BundleExpander {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Default components of a bundle, joined to live product rows. Fails
    /// with `NotABundle` when the id points at a single item.
    pub async fn expand(&self, bundle_id: &ProductId) -> Result<BundleExpansion, EngineError> {
        let bundle = self
            .catalog
            .find_by_id(bundle_id)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(bundle_id.clone()))?;

        if !bundle.kind.is_bundle() {
            return Err(EngineError::NotABundle(bundle_id.clone()));
        }

        let slots = self.catalog.bundle_defaults(bundle_id).await?;
        Ok(BundleExpansion { bundle, slots })
    }

    /// In-stock swap candidates for one category, cheapest first.
    pub async fn changeable_options(
        &self,
        category: ProductKind,
    ) -> Result<Vec<Product>, EngineError> {
        Ok(self.catalog.options_for_kind(category).await?)
    }

    /// Current defaults plus the swap candidates for every distinct component
    /// category, in slot order.
    pub async fn options(&self, bundle_id: &ProductId) -> Result<BundleOptions, EngineError> {
        let expansion = self.expand(bundle_id).await?;

        let components: Vec<ComponentOption> = expansion
            .slots
            .iter()
            .map(|slot| ComponentOption {
                product_id: slot.product.id.clone(),
                name: slot.product.name.clone(),
                category: slot.product.kind,
                price: slot.product.price,
                quantity: slot.component.quantity,
            })
            .collect();

        let mut swap_candidates: Vec<CategoryOptions> = Vec::new();
        for component in &components {
            if swap_candidates.iter().any(|entry| entry.category == component.category) {
                continue;
            }
            let options = self
                .changeable_options(component.category)
                .await?
                .into_iter()
                .map(|product| ComponentOption {
                    product_id: product.id,
                    name: product.name,
                    category: product.kind,
                    price: product.price,
                    quantity: 1,
                })
                .collect();
            swap_candidates.push(CategoryOptions { category: component.category, options });
        }

        Ok(BundleOptions {
            bundle_id: expansion.bundle.id,
            bundle_name: expansion.bundle.name,
            bundle_price: expansion.bundle.price,
            components,
            swap_candidates,
        })
    }
}
