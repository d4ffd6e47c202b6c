//! Modification pricing.
//!
//! All deltas are computed against catalog prices at the moment the
//! modification is created. Component swaps are always measured against the
//! slot's canonical default, never against whatever the cart currently holds,
//! so repeated swaps cannot compound.

use serde::{Deserialize, Serialize};

use crate::domain::modification::{Modification, ModificationKind};
use crate::domain::product::Product;
use crate::errors::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat surcharge for a size upgrade; no product lookup involved.
    pub size_upgrade_delta: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { size_upgrade_delta: 200 }
    }
}

/// Add-on delta is the full price of the added product.
pub fn price_add_on(added: &Product) -> Modification {
    Modification {
        kind: ModificationKind::AddOn,
        from_product_id: None,
        to_product_id: Some(added.id.clone()),
        description: format!("{} added", added.name),
        price_delta: added.price,
    }
}

/// Swap delta = price(replacement) - price(slot default). Swapping across
/// categories is rejected outright; the engine never reclassifies a slot.
pub fn price_component_swap(
    slot_default: &Product,
    replacement: &Product,
) -> Result<Modification, EngineError> {
    if slot_default.kind != replacement.kind {
        return Err(EngineError::CategoryMismatch {
            expected: slot_default.kind,
            found: replacement.kind,
        });
    }

    Ok(Modification {
        kind: ModificationKind::ComponentSwap,
        from_product_id: Some(slot_default.id.clone()),
        to_product_id: Some(replacement.id.clone()),
        description: format!("{} \u{2192} {}", slot_default.name, replacement.name),
        price_delta: replacement.price - slot_default.price,
    })
}

pub fn price_size_upgrade(config: &PricingConfig) -> Modification {
    Modification {
        kind: ModificationKind::SizeUpgrade,
        from_product_id: None,
        to_product_id: None,
        description: "Large size upgrade".to_string(),
        price_delta: config.size_upgrade_delta,
    }
}
