//! Unit pricing shared by the cart and checkout.

use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use crate::product::{ItemKind, Product, BUNDLE_SEPARATOR};

/// Price of ONE unit of a cart item.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPrice {
    pub label: String,
    pub upfront: f64,
    pub monthly: f64,
}

/// Rounds to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Splits a bundle sku into its phone and plan halves at the first separator.
pub fn split_bundle_sku(sku: &str) -> StoreResult<(&str, &str)> {
    sku.split_once(BUNDLE_SEPARATOR)
        .ok_or_else(|| StoreError::InvalidBundleSku(sku.to_string()))
}

fn unknown(kind: ItemKind, sku: &str) -> StoreError {
    StoreError::UnknownItem { kind: kind.to_string(), sku: sku.to_string() }
}

/// Looks up the product behind a phone or plan item, checking its kind.
pub fn resolve(catalog: &Catalog, sku: &str, kind: ItemKind) -> StoreResult<Product> {
    let product = catalog.get(sku).map_err(|_| unknown(kind, sku))?;
    if ItemKind::from(product.kind()) != kind {
        return Err(unknown(kind, sku));
    }
    Ok(product)
}

pub fn price_for_item(catalog: &Catalog, sku: &str, kind: ItemKind) -> StoreResult<UnitPrice> {
    match kind {
        ItemKind::Phone | ItemKind::Plan => {
            let product = resolve(catalog, sku, kind)?;
            Ok(UnitPrice {
                label: product.name().to_string(),
                upfront: product.upfront_price().unwrap_or(0.0),
                monthly: product.monthly_fee().unwrap_or(0.0),
            })
        }
        ItemKind::Bundle => {
            let (phone_sku, plan_sku) = split_bundle_sku(sku)?;
            let phone = price_for_item(catalog, phone_sku, ItemKind::Phone)?;
            let plan = price_for_item(catalog, plan_sku, ItemKind::Plan)?;
            Ok(UnitPrice {
                label: format!("{} + {}", phone.label, plan.label),
                upfront: phone.upfront,
                monthly: plan.monthly,
            })
        }
    }
}
