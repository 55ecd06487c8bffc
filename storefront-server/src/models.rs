//! Defines the data structures used for API request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::{ItemKind, Product};

fn default_qty() -> i64 {
    1
}

// --- Request Bodies ---

/// Request body for `POST /products/bulk`.
#[derive(Deserialize)]
pub struct BulkUpsertRequest {
    pub items: Vec<Value>,
}

/// Request body for adding an item to a cart.
#[derive(Deserialize)]
pub struct AddItemRequest {
    pub sku: String,
    pub kind: ItemKind,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

/// Request body for setting a cart line's quantity.
#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub sku: String,
    pub kind: ItemKind,
    pub qty: i64,
}

/// Request body for quoting a session's cart.
#[derive(Deserialize)]
pub struct CartQuoteRequest {
    #[serde(default)]
    pub shipping_option_index: usize,
}

// --- Response Bodies ---

#[derive(Serialize)]
pub struct ProductListResponse {
    pub items: Vec<Product>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Serialize)]
pub struct BulkUpsertResponse {
    pub upserted: usize,
}

#[derive(Serialize)]
pub struct ShippingOptionResponse {
    /// Position to pass as `shipping_option_index`.
    pub index: usize,
    pub name: String,
    pub cost: f64,
    pub estimated_days: u32,
}

/// Database connection details safe to expose; never includes passwords.
#[derive(Serialize)]
pub struct DatabaseInfo {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub products: usize,
    pub database: DatabaseInfo,
}
