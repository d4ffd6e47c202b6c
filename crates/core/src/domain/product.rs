use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sellable item category. `Bundle` products are composed of default
/// components from the other categories and never appear as cart lines
/// themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Burger,
    Sides,
    Beverage,
    Dessert,
    Bundle,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Burger => "burger",
            ProductKind::Sides => "sides",
            ProductKind::Beverage => "beverage",
            ProductKind::Dessert => "dessert",
            ProductKind::Bundle => "bundle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "burger" => Some(ProductKind::Burger),
            "sides" => Some(ProductKind::Sides),
            "beverage" => Some(ProductKind::Beverage),
            "dessert" => Some(ProductKind::Dessert),
            "bundle" => Some(ProductKind::Bundle),
            _ => None,
        }
    }

    pub fn is_bundle(&self) -> bool {
        matches!(self, ProductKind::Bundle)
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entry. Prices are integer minor currency units. The embedding
/// vector is optional; products without one never match semantic search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub kind: ProductKind,
    pub price: i64,
    pub description: Option<String>,
    pub stock_quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Product {
    pub fn in_stock(&self, requested: u32) -> bool {
        self.stock_quantity >= requested
    }
}

/// Relates a bundle product to one member product. Only `is_default` rows
/// define the bundle's base composition; non-default rows are alternative
/// members for the same slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleComponent {
    pub bundle_id: ProductId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub is_default: bool,
}
