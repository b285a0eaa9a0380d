use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalogue identifier assigned by the backend.
pub type ProductId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Medicine,
    Supplement,
    Device,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Medicine => write!(f, "medicine"),
            ProductType::Supplement => write!(f, "supplement"),
            ProductType::Device => write!(f, "device"),
        }
    }
}

/// A catalogue product as returned by `GET /products/`.
///
/// Owned by the catalogue service; the cart only keeps a copy so it can show
/// names and compute totals offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Price as a decimal string, exactly as the backend returns it, e.g. `"25000.00"`.
    pub price: String,
    pub product_type: ProductType,
    pub requires_prescription: bool,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_ingredient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
}

fn default_available() -> bool {
    true
}

impl Product {
    /// Parses the string price into a [`Decimal`].
    ///
    /// Returns `None` when the text is not a number or is negative.
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        Decimal::from_str(self.price.trim())
            .ok()
            .filter(|p| *p >= Decimal::ZERO)
    }
}

/// One product plus its requested quantity within the cart.
///
/// Serialized as `{"product": {...}, "quantity": n}`, the layout persisted
/// under the cart storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartLineItem {
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }
}
