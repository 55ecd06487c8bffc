//! Catalog product model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

/// Separator joining a phone sku and a plan sku into a bundle sku.
pub const BUNDLE_SEPARATOR: char = '|';

/// Kind of a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Phone,
    Plan,
}

/// Kind of a cart line. A bundle pairs one phone with one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Phone,
    Plan,
    Bundle,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Phone => "phone",
            ItemKind::Plan => "plan",
            ItemKind::Bundle => "bundle",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(ItemKind::Phone),
            "plan" => Ok(ItemKind::Plan),
            "bundle" => Ok(ItemKind::Bundle),
            other => Err(StoreError::InvalidKind(other.to_string())),
        }
    }
}

impl From<ProductKind> for ItemKind {
    fn from(kind: ProductKind) -> Self {
        match kind {
            ProductKind::Phone => ItemKind::Phone,
            ProductKind::Plan => ItemKind::Plan,
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneProduct {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub upfront_price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanProduct {
    pub sku: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub monthly_fee: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_gb: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A catalog entry, tagged on the wire by its `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Product {
    Phone(PhoneProduct),
    Plan(PlanProduct),
}

impl Product {
    pub fn sku(&self) -> &str {
        match self {
            Product::Phone(p) => &p.sku,
            Product::Plan(p) => &p.sku,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Product::Phone(p) => &p.name,
            Product::Plan(p) => &p.name,
        }
    }

    pub fn kind(&self) -> ProductKind {
        match self {
            Product::Phone(_) => ProductKind::Phone,
            Product::Plan(_) => ProductKind::Plan,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Product::Phone(p) => p.active,
            Product::Plan(p) => p.active,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Product::Phone(p) => &p.description,
            Product::Plan(p) => &p.description,
        }
    }

    pub fn highlights(&self) -> &[String] {
        match self {
            Product::Phone(p) => &p.highlights,
            Product::Plan(p) => &p.highlights,
        }
    }

    /// Phones only.
    pub fn brand(&self) -> Option<&str> {
        match self {
            Product::Phone(p) => Some(&p.brand),
            Product::Plan(_) => None,
        }
    }

    /// Plans only; a plan may have no network.
    pub fn network(&self) -> Option<&str> {
        match self {
            Product::Phone(_) => None,
            Product::Plan(p) => p.network.as_deref(),
        }
    }

    pub fn upfront_price(&self) -> Option<f64> {
        match self {
            Product::Phone(p) => Some(p.upfront_price),
            Product::Plan(_) => None,
        }
    }

    pub fn monthly_fee(&self) -> Option<f64> {
        match self {
            Product::Phone(_) => None,
            Product::Plan(p) => Some(p.monthly_fee),
        }
    }

    /// Lowercased text searched by the catalog's free-text filter.
    pub(crate) fn search_text(&self) -> String {
        let highlights = self.highlights().join(" ");
        [
            self.name(),
            self.brand().unwrap_or(""),
            self.network().unwrap_or(""),
            self.description(),
            highlights.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Checks the field invariants every stored product must hold.
    pub fn validate(&self) -> StoreResult<()> {
        validate_sku(self.sku())?;
        if self.name().trim().is_empty() {
            return Err(StoreError::InvalidProduct(format!("name must not be empty (sku '{}')", self.sku())));
        }
        match self {
            Product::Phone(p) => {
                if p.brand.trim().is_empty() {
                    return Err(StoreError::InvalidProduct(format!("brand must not be empty (sku '{}')", p.sku)));
                }
                validate_amount("upfront_price", p.upfront_price)
            }
            Product::Plan(p) => validate_amount("monthly_fee", p.monthly_fee),
        }
    }
}

fn validate_sku(sku: &str) -> StoreResult<()> {
    if sku.is_empty() {
        return Err(StoreError::InvalidProduct("sku must not be empty".to_string()));
    }
    if sku.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidProduct(format!("sku '{}' must not contain whitespace", sku)));
    }
    if sku.contains(BUNDLE_SEPARATOR) {
        return Err(StoreError::InvalidProduct(format!(
            "sku '{}' must not contain '{}'",
            sku, BUNDLE_SEPARATOR
        )));
    }
    Ok(())
}

fn validate_amount(field: &str, value: f64) -> StoreResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(StoreError::InvalidProduct(format!("{} must be a non-negative number, got {}", field, value)));
    }
    Ok(())
}
