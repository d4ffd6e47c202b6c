use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use burgeria_core::domain::cart::{
    BundleGroupId, CartLine, CartLineId, CartSummary, LineKind, SessionId,
};
use burgeria_core::domain::modification::{Modification, ModificationKind};
use burgeria_core::domain::product::{Product, ProductId};
use burgeria_core::errors::EngineError;
use burgeria_core::pricing::{self, PricingConfig};
use burgeria_db::{CartRepository, CatalogRepository};

use crate::bundle::BundleExpander;

/// Caller-facing modification request; the priced `Modification` is always
/// derived from catalog prices, never taken from input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModificationRequest {
    AddOn { product_id: ProductId },
    ComponentSwap { from_product_id: ProductId, to_product_id: ProductId },
    SizeUpgrade,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddToCartReceipt {
    pub lines: Vec<CartLine>,
    pub amount_added: i64,
    pub bundle_group_id: Option<BundleGroupId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub summary: CartSummary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateOutcome {
    Updated { line: CartLine },
    Removed { line_id: CartLineId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReceipt {
    pub removed: u64,
    pub remaining: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClearTarget {
    Line(CartLineId),
    All,
}

/// Outcome of `replace_component`. `MultipleGroups` is a required-choice
/// signal: no mutation happened and the caller must re-invoke with an
/// explicit group id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplaceOutcome {
    Updated { line: CartLine, price_delta: i64 },
    MultipleGroups { candidates: Vec<GroupCandidate> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupCandidate {
    pub bundle_group_id: BundleGroupId,
    pub line_id: CartLineId,
    pub display_name: String,
}

/// Session-scoped cart ledger. Bundle purchases explode into one line per
/// default slot, all sharing a freshly generated bundle group id.
pub struct CartService {
    catalog: Arc<dyn CatalogRepository>,
    cart: Arc<dyn CartRepository>,
    expander: BundleExpander,
    pricing: PricingConfig,
}

impl CartService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        cart: Arc<dyn CartRepository>,
        pricing: PricingConfig,
    ) -> Self {
        let expander = BundleExpander::new(Arc::clone(&catalog));
        Self { catalog, cart, expander, pricing }
    }

    pub async fn add_to_cart(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: u32,
        is_bundle: bool,
        requests: &[ModificationRequest],
        notes: Option<&str>,
    ) -> Result<AddToCartReceipt, EngineError> {
        let quantity = quantity.max(1);
        let product = self
            .catalog
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(product_id.clone()))?;

        if is_bundle && !product.kind.is_bundle() {
            return Err(EngineError::NotABundle(product_id.clone()));
        }

        let notes = notes.unwrap_or_default();
        let lines = if product.kind.is_bundle() {
            self.compose_bundle_lines(session_id, product_id, quantity, requests, notes).await?
        } else {
            vec![self.compose_single_line(session_id, &product, quantity, requests, notes).await?]
        };

        self.cart.insert_lines(&lines).await?;

        let amount_added = lines.iter().map(CartLine::line_total).sum();
        let bundle_group_id = lines.first().and_then(|line| line.bundle_group_id.clone());
        tracing::info!(
            event_name = "cart.lines_added",
            session_id = %session_id,
            product_id = %product_id,
            line_count = lines.len(),
            amount_added,
        );

        Ok(AddToCartReceipt { lines, amount_added, bundle_group_id })
    }

    pub async fn get_cart(&self, session_id: &SessionId) -> Result<CartView, EngineError> {
        let lines = self.cart.lines_for_session(session_id).await?;
        let summary = CartSummary::from_lines(&lines);
        Ok(CartView { lines, summary })
    }

    pub async fn update_quantity(
        &self,
        session_id: &SessionId,
        line_id: &CartLineId,
        new_quantity: u32,
    ) -> Result<UpdateOutcome, EngineError> {
        if new_quantity == 0 {
            let removed = self.cart.delete_line(session_id, line_id).await?;
            if removed == 0 {
                return Err(EngineError::LineNotFound(line_id.clone()));
            }
            tracing::info!(
                event_name = "cart.line_removed",
                session_id = %session_id,
                line_id = %line_id,
            );
            return Ok(UpdateOutcome::Removed { line_id: line_id.clone() });
        }

        let updated = self.cart.update_quantity(session_id, line_id, new_quantity).await?;
        if !updated {
            return Err(EngineError::LineNotFound(line_id.clone()));
        }

        let line = self
            .cart
            .find_line(session_id, line_id)
            .await?
            .ok_or_else(|| EngineError::LineNotFound(line_id.clone()))?;
        tracing::info!(
            event_name = "cart.quantity_updated",
            session_id = %session_id,
            line_id = %line_id,
            new_quantity,
        );
        Ok(UpdateOutcome::Updated { line })
    }

    pub async fn clear(
        &self,
        session_id: &SessionId,
        target: ClearTarget,
    ) -> Result<ClearReceipt, EngineError> {
        let removed = match &target {
            ClearTarget::Line(line_id) => {
                let removed = self.cart.delete_line(session_id, line_id).await?;
                if removed == 0 {
                    return Err(EngineError::LineNotFound(line_id.clone()));
                }
                removed
            }
            ClearTarget::All => self.cart.clear_session(session_id).await?,
        };

        let remaining = self.cart.count_for_session(session_id).await?;
        tracing::info!(
            event_name = "cart.cleared",
            session_id = %session_id,
            removed,
            remaining,
        );
        Ok(ClearReceipt { removed, remaining })
    }

    /// Rewrite one bundle component line in place. When no group id is given
    /// and exactly one bundle group holds `old_product_id`, that group is
    /// auto-selected; more than one match returns the candidates untouched.
    pub async fn replace_component(
        &self,
        session_id: &SessionId,
        old_product_id: &ProductId,
        new_product_id: &ProductId,
        bundle_group_id: Option<&BundleGroupId>,
    ) -> Result<ReplaceOutcome, EngineError> {
        let lines = self.cart.lines_for_session(session_id).await?;
        let matching: Vec<(&BundleGroupId, &CartLine)> = lines
            .iter()
            .filter_map(|line| {
                let group = line.bundle_group_id.as_ref()?;
                (line.product_id == *old_product_id).then_some((group, line))
            })
            .collect();

        let target = match bundle_group_id {
            Some(group) => matching
                .iter()
                .find(|(candidate, _)| *candidate == group)
                .map(|(_, line)| *line)
                .ok_or_else(|| EngineError::ProductNotFound(old_product_id.clone()))?,
            None => match matching.as_slice() {
                [] => return Err(EngineError::ProductNotFound(old_product_id.clone())),
                [(_, only)] => *only,
                _ => {
                    let candidates = matching
                        .iter()
                        .map(|(group, line)| GroupCandidate {
                            bundle_group_id: (*group).clone(),
                            line_id: line.id.clone(),
                            display_name: line.display_name.clone(),
                        })
                        .collect();
                    return Ok(ReplaceOutcome::MultipleGroups { candidates });
                }
            },
        };

        let current = self
            .catalog
            .find_by_id(&target.product_id)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(target.product_id.clone()))?;
        let replacement = self
            .catalog
            .find_by_id(new_product_id)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(new_product_id.clone()))?;

        if replacement.kind != current.kind {
            return Err(EngineError::CategoryMismatch {
                expected: current.kind,
                found: replacement.kind,
            });
        }
        check_stock(&replacement, target.quantity)?;

        // Delta is measured against the slot default the line was created
        // with, so repeated swaps never compound.
        let swap = Modification {
            kind: ModificationKind::ComponentSwap,
            from_product_id: Some(current.id.clone()),
            to_product_id: Some(replacement.id.clone()),
            description: format!("{} \u{2192} {}", current.name, replacement.name),
            price_delta: replacement.price - target.unit_base_price,
        };

        let mut modifications: Vec<Modification> = target
            .modifications
            .iter()
            .filter(|m| m.kind != ModificationKind::ComponentSwap)
            .cloned()
            .collect();
        let price_delta = swap.price_delta;
        modifications.push(swap);

        self.cart
            .replace_line_product(&target.id, &replacement.id, &replacement.name, &modifications)
            .await?;

        let line = self
            .cart
            .find_line(session_id, &target.id)
            .await?
            .ok_or_else(|| EngineError::LineNotFound(target.id.clone()))?;
        tracing::info!(
            event_name = "cart.component_replaced",
            session_id = %session_id,
            line_id = %line.id,
            from = %old_product_id,
            to = %new_product_id,
            price_delta,
        );
        Ok(ReplaceOutcome::Updated { line, price_delta })
    }

    async fn compose_bundle_lines(
        &self,
        session_id: &SessionId,
        bundle_id: &ProductId,
        quantity: u32,
        requests: &[ModificationRequest],
        notes: &str,
    ) -> Result<Vec<CartLine>, EngineError> {
        let expansion = self.expander.expand(bundle_id).await?;
        let group = BundleGroupId(Uuid::new_v4().to_string());
        let created_at = Utc::now();

        let mut lines = Vec::with_capacity(expansion.slots.len());
        for (index, slot) in expansion.slots.iter().enumerate() {
            let line_quantity = slot.component.quantity * quantity;
            check_stock(&slot.product, line_quantity)?;

            let mut product = slot.product.clone();
            let mut modifications = Vec::new();
            for request in requests {
                match request {
                    ModificationRequest::ComponentSwap { from_product_id, to_product_id }
                        if *from_product_id == slot.product.id =>
                    {
                        let replacement = self
                            .catalog
                            .find_by_id(to_product_id)
                            .await?
                            .ok_or_else(|| EngineError::ProductNotFound(to_product_id.clone()))?;
                        check_stock(&replacement, line_quantity)?;
                        modifications.push(pricing::price_component_swap(&slot.product, &replacement)?);
                        product = replacement;
                    }
                    ModificationRequest::ComponentSwap { .. } => {}
                    // Add-ons and size upgrades ride on the main (first) slot.
                    ModificationRequest::AddOn { product_id } if index == 0 => {
                        let added = self
                            .catalog
                            .find_by_id(product_id)
                            .await?
                            .ok_or_else(|| EngineError::ProductNotFound(product_id.clone()))?;
                        modifications.push(pricing::price_add_on(&added));
                    }
                    ModificationRequest::AddOn { .. } => {}
                    ModificationRequest::SizeUpgrade if index == 0 => {
                        modifications.push(pricing::price_size_upgrade(&self.pricing));
                    }
                    ModificationRequest::SizeUpgrade => {}
                }
            }

            lines.push(CartLine {
                id: CartLineId(Uuid::new_v4().to_string()),
                session_id: session_id.clone(),
                product_id: product.id.clone(),
                display_name: product.name.clone(),
                line_kind: LineKind::BundleComponent,
                quantity: line_quantity,
                // Component-sum pricing: the slot default's own price, not a
                // share of the bundle's listed price.
                unit_base_price: slot.product.price,
                modifications,
                notes: notes.to_string(),
                bundle_group_id: Some(group.clone()),
                created_at,
            });
        }

        Ok(lines)
    }

    async fn compose_single_line(
        &self,
        session_id: &SessionId,
        product: &Product,
        quantity: u32,
        requests: &[ModificationRequest],
        notes: &str,
    ) -> Result<CartLine, EngineError> {
        check_stock(product, quantity)?;

        let mut line_product = product.clone();
        let mut modifications = Vec::new();
        for request in requests {
            match request {
                ModificationRequest::AddOn { product_id } => {
                    let added = self
                        .catalog
                        .find_by_id(product_id)
                        .await?
                        .ok_or_else(|| EngineError::ProductNotFound(product_id.clone()))?;
                    modifications.push(pricing::price_add_on(&added));
                }
                ModificationRequest::ComponentSwap { to_product_id, .. } => {
                    let replacement = self
                        .catalog
                        .find_by_id(to_product_id)
                        .await?
                        .ok_or_else(|| EngineError::ProductNotFound(to_product_id.clone()))?;
                    check_stock(&replacement, quantity)?;
                    modifications.push(pricing::price_component_swap(product, &replacement)?);
                    line_product = replacement;
                }
                ModificationRequest::SizeUpgrade => {
                    modifications.push(pricing::price_size_upgrade(&self.pricing));
                }
            }
        }

        Ok(CartLine {
            id: CartLineId(Uuid::new_v4().to_string()),
            session_id: session_id.clone(),
            product_id: line_product.id.clone(),
            display_name: line_product.name.clone(),
            line_kind: LineKind::Single,
            quantity,
            unit_base_price: product.price,
            modifications,
            notes: notes.to_string(),
            bundle_group_id: None,
            created_at: Utc::now(),
        })
    }
}

fn check_stock(product: &Product, requested: u32) -> Result<(), EngineError> {
    if !product.in_stock(requested) {
        return Err(EngineError::OutOfStock {
            product_id: product.id.clone(),
            name: product.name.clone(),
            requested,
            available: product.stock_quantity,
        });
    }
    Ok(())
}
