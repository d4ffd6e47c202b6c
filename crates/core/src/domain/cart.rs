use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::modification::Modification;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartLineId(pub String);

impl fmt::Display for CartLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared by every cart line produced from one bundle purchase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleGroupId(pub String);

impl fmt::Display for BundleGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Single,
    BundleComponent,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Single => "single",
            LineKind::BundleComponent => "bundle_component",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(LineKind::Single),
            "bundle_component" => Some(LineKind::BundleComponent),
            _ => None,
        }
    }
}

/// One priced cart row. For bundle purchases there is one line per default
/// component slot; `unit_base_price` stays the slot default price even after
/// a component swap, so swap deltas never compound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub session_id: SessionId,
    pub product_id: ProductId,
    pub display_name: String,
    pub line_kind: LineKind,
    pub quantity: u32,
    pub unit_base_price: i64,
    pub modifications: Vec<Modification>,
    pub notes: String,
    pub bundle_group_id: Option<BundleGroupId>,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    pub fn modification_delta(&self) -> i64 {
        self.modifications.iter().map(|m| m.price_delta).sum()
    }

    /// `(unit_base_price + Σ price_delta) × quantity`, always recomputed from
    /// the line's inputs rather than read from storage.
    pub fn line_total(&self) -> i64 {
        (self.unit_base_price + self.modification_delta()) * i64::from(self.quantity)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub line_count: usize,
    pub total_quantity: u32,
    pub amount: i64,
}

impl CartSummary {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            line_count: lines.len(),
            total_quantity: lines.iter().map(|line| line.quantity).sum(),
            amount: lines.iter().map(CartLine::line_total).sum(),
        }
    }
}
