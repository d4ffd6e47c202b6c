use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    AddOn,
    ComponentSwap,
    SizeUpgrade,
}

impl ModificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationKind::AddOn => "add_on",
            ModificationKind::ComponentSwap => "component_swap",
            ModificationKind::SizeUpgrade => "size_upgrade",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add_on" => Some(ModificationKind::AddOn),
            "component_swap" => Some(ModificationKind::ComponentSwap),
            "size_upgrade" => Some(ModificationKind::SizeUpgrade),
            _ => None,
        }
    }
}

/// A priced adjustment attached to one cart line. The description is derived
/// from catalog names when the modification is priced, never caller-supplied
/// free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub kind: ModificationKind,
    pub from_product_id: Option<ProductId>,
    pub to_product_id: Option<ProductId>,
    pub description: String,
    pub price_delta: i64,
}
