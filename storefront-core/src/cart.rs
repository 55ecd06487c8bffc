//! Session carts.
//!
//! A cart maps `(sku, kind)` to a quantity. Lines keep the order in which
//! they were first added; prices are never stored, they are recomputed from
//! the catalog every time a cart is materialized.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use crate::pricing::{price_for_item, resolve, round2, split_bundle_sku, UnitPrice};
use crate::product::ItemKind;

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartKey {
    pub sku: String,
    pub kind: ItemKind,
}

impl CartKey {
    pub fn new(sku: impl Into<String>, kind: ItemKind) -> Self {
        CartKey { sku: sku.into(), kind }
    }
}

fn default_qty() -> i64 {
    1
}

/// An item as submitted by a client, e.g. in a checkout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// `p-iphone-15`, `plan-basic` or a bundle `p-iphone-15|plan-basic`.
    pub sku: String,
    pub kind: ItemKind,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

impl CartItem {
    pub fn new(sku: impl Into<String>, kind: ItemKind, qty: i64) -> Self {
        CartItem { sku: sku.into(), kind, qty }
    }

    /// Prices the whole line (unit price times quantity), unrounded.
    pub fn prices(&self, catalog: &Catalog) -> StoreResult<UnitPrice> {
        if self.qty < 1 {
            return Err(StoreError::InvalidQuantity("qty must be >= 1".to_string()));
        }
        let unit = price_for_item(catalog, &self.sku, self.kind)?;
        let qty = self.qty as f64;
        Ok(UnitPrice { label: unit.label, upfront: unit.upfront * qty, monthly: unit.monthly * qty })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub sku: String,
    pub kind: ItemKind,
    pub qty: u32,
    pub label: String,
    pub upfront_subtotal: f64,
    pub monthly_subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    pub upfront_total: f64,
    pub monthly_total: f64,
    pub item_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub totals: CartTotals,
}

impl CartView {
    /// The priced lines as checkout items.
    pub fn to_items(&self) -> Vec<CartItem> {
        self.items
            .iter()
            .map(|line| CartItem::new(line.sku.clone(), line.kind, i64::from(line.qty)))
            .collect()
    }
}

/// Persistence for cart quantities. Implementations only store quantities;
/// validation and pricing belong to [`CartService`].
#[async_trait]
pub trait CartStore: Send + Sync + Debug {
    /// Lines of a session's cart in insertion order. Unknown sessions have
    /// an empty cart.
    async fn lines(&self, session_id: &str) -> StoreResult<Vec<(CartKey, u32)>>;

    /// Adds `qty` to a line, creating it if needed. Returns the new quantity.
    async fn add_qty(&self, session_id: &str, key: CartKey, qty: u32) -> StoreResult<u32>;

    /// Sets a line's quantity; zero removes the line.
    async fn set_qty(&self, session_id: &str, key: CartKey, qty: u32) -> StoreResult<()>;

    async fn clear(&self, session_id: &str) -> StoreResult<()>;
}

/// Process-local cart store.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<String, Vec<(CartKey, u32)>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.carts.read().await.len()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn lines(&self, session_id: &str) -> StoreResult<Vec<(CartKey, u32)>> {
        Ok(self.carts.read().await.get(session_id).cloned().unwrap_or_default())
    }

    async fn add_qty(&self, session_id: &str, key: CartKey, qty: u32) -> StoreResult<u32> {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(session_id.to_string()).or_default();
        match cart.iter_mut().find(|(k, _)| *k == key) {
            Some((_, current)) => {
                *current = current.saturating_add(qty);
                Ok(*current)
            }
            None => {
                cart.push((key, qty));
                Ok(qty)
            }
        }
    }

    async fn set_qty(&self, session_id: &str, key: CartKey, qty: u32) -> StoreResult<()> {
        let mut carts = self.carts.write().await;
        if qty == 0 {
            // Only sessions that already exist can lose a line.
            if let Some(cart) = carts.get_mut(session_id) {
                cart.retain(|(k, _)| *k != key);
                if cart.is_empty() {
                    carts.remove(session_id);
                }
            }
            return Ok(());
        }
        let cart = carts.entry(session_id.to_string()).or_default();
        match cart.iter_mut().find(|(k, _)| *k == key) {
            Some((_, current)) => *current = qty,
            None => cart.push((key, qty)),
        }
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> StoreResult<()> {
        self.carts.write().await.remove(session_id);
        Ok(())
    }
}

/// Business logic for cart management on top of a [`CartStore`].
#[derive(Debug, Clone)]
pub struct CartService {
    catalog: Arc<Catalog>,
    store: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn CartStore>) -> Self {
        CartService { catalog, store }
    }

    pub fn in_memory(catalog: Arc<Catalog>) -> Self {
        Self::new(catalog, Arc::new(InMemoryCartStore::new()))
    }

    pub async fn view(&self, session_id: &str) -> StoreResult<CartView> {
        let lines = self.store.lines(session_id).await?;
        Ok(self.materialize(session_id, &lines))
    }

    pub async fn add(&self, session_id: &str, sku: &str, kind: ItemKind, qty: i64) -> StoreResult<CartView> {
        if qty < 1 {
            return Err(StoreError::InvalidQuantity("qty must be >= 1".to_string()));
        }
        let qty = to_u32(qty)?;
        self.validate_item(sku, kind)?;
        let new_qty = self.store.add_qty(session_id, CartKey::new(sku, kind), qty).await?;
        info!(session_id, sku, %kind, added = qty, qty = new_qty, "Item added to cart");
        self.view(session_id).await
    }

    /// Sets a line's quantity. Zero removes the line without validating it.
    pub async fn update_qty(&self, session_id: &str, sku: &str, kind: ItemKind, qty: i64) -> StoreResult<CartView> {
        if qty < 0 {
            return Err(StoreError::InvalidQuantity("qty must be >= 0".to_string()));
        }
        let qty = to_u32(qty)?;
        if qty > 0 {
            self.validate_item(sku, kind)?;
        }
        self.store.set_qty(session_id, CartKey::new(sku, kind), qty).await?;
        info!(session_id, sku, %kind, qty, "Cart quantity updated");
        self.view(session_id).await
    }

    pub async fn remove(&self, session_id: &str, sku: &str, kind: ItemKind) -> StoreResult<CartView> {
        self.store.set_qty(session_id, CartKey::new(sku, kind), 0).await?;
        info!(session_id, sku, %kind, "Item removed from cart");
        self.view(session_id).await
    }

    pub async fn clear(&self, session_id: &str) -> StoreResult<CartView> {
        self.store.clear(session_id).await?;
        info!(session_id, "Cart cleared");
        self.view(session_id).await
    }

    /// Current priced lines as checkout items.
    pub async fn items(&self, session_id: &str) -> StoreResult<Vec<CartItem>> {
        Ok(self.view(session_id).await?.to_items())
    }

    /// The item must price and every product behind it must be active.
    fn validate_item(&self, sku: &str, kind: ItemKind) -> StoreResult<()> {
        price_for_item(&self.catalog, sku, kind)?;
        let parts = match kind {
            ItemKind::Bundle => {
                let (phone, plan) = split_bundle_sku(sku)?;
                vec![(phone, ItemKind::Phone), (plan, ItemKind::Plan)]
            }
            _ => vec![(sku, kind)],
        };
        for (part_sku, part_kind) in parts {
            if !resolve(&self.catalog, part_sku, part_kind)?.is_active() {
                return Err(StoreError::Unavailable(part_sku.to_string()));
            }
        }
        Ok(())
    }

    fn materialize(&self, session_id: &str, lines: &[(CartKey, u32)]) -> CartView {
        let mut items = Vec::with_capacity(lines.len());
        let mut upfront_total = 0.0;
        let mut monthly_total = 0.0;
        let mut item_count: u64 = 0;

        for (key, qty) in lines {
            if *qty == 0 {
                continue;
            }
            let unit = match price_for_item(&self.catalog, &key.sku, key.kind) {
                Ok(unit) => unit,
                Err(e) => {
                    // The product was removed from the catalog after being added.
                    warn!(session_id, sku = %key.sku, kind = %key.kind, error = %e, "Dropping unpriceable cart line");
                    continue;
                }
            };
            let upfront_subtotal = round2(unit.upfront * f64::from(*qty));
            let monthly_subtotal = round2(unit.monthly * f64::from(*qty));
            upfront_total += upfront_subtotal;
            monthly_total += monthly_subtotal;
            item_count += u64::from(*qty);
            items.push(CartLine {
                sku: key.sku.clone(),
                kind: key.kind,
                qty: *qty,
                label: unit.label,
                upfront_subtotal,
                monthly_subtotal,
            });
        }

        debug!(session_id, lines = items.len(), item_count, "Cart materialized");
        CartView {
            items,
            totals: CartTotals {
                upfront_total: round2(upfront_total),
                monthly_total: round2(monthly_total),
                item_count,
            },
        }
    }
}

fn to_u32(qty: i64) -> StoreResult<u32> {
    u32::try_from(qty).map_err(|_| StoreError::InvalidQuantity(format!("qty {} is too large", qty)))
}
