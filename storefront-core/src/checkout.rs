use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::CartItem;
use crate::catalog::Catalog;
use crate::config::CheckoutConfig;
use crate::error::{StoreError, StoreResult};
use crate::pricing::round2;

/// Length of generated order identifiers, in hex characters.
pub const ORDER_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub name: String,
    pub cost: f64,
    pub estimated_days: u32,
}

impl ShippingOption {
    pub fn new(name: impl Into<String>, cost: f64, estimated_days: u32) -> Self {
        ShippingOption { name: name.into(), cost, estimated_days }
    }

    pub fn calculate_cost(&self) -> f64 {
        self.cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSummary {
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub currency: String,
    pub items: Vec<LineSummary>,
    pub shipping: LineSummary,
    pub tax: LineSummary,
    pub monthly_total: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CartItem>,
    pub shipping_option_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub status: OrderStatus,
    pub currency: String,
    pub grand_total: f64,
    pub monthly_total: f64,
    pub created_at: DateTime<Utc>,
}

/// Stateless calculator for quotes and order confirmation.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    catalog: Arc<Catalog>,
    shipping_options: Vec<ShippingOption>,
    config: CheckoutConfig,
}

impl CheckoutService {
    pub fn new(catalog: Arc<Catalog>, shipping_options: Vec<ShippingOption>, config: CheckoutConfig) -> StoreResult<Self> {
        config.validate()?;
        if let Some(bad) = shipping_options.iter().find(|o| !o.cost.is_finite() || o.cost < 0.0) {
            return Err(StoreError::Configuration(format!(
                "shipping option '{}' has an invalid cost {}",
                bad.name, bad.cost
            )));
        }
        Ok(CheckoutService { catalog, shipping_options, config })
    }

    pub fn shipping_options(&self) -> &[ShippingOption] {
        &self.shipping_options
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn quote(&self, items: &[CartItem], shipping_option_index: usize) -> StoreResult<Quote> {
        if items.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        let ship = self
            .shipping_options
            .get(shipping_option_index)
            .ok_or(StoreError::InvalidShippingOption(shipping_option_index))?;

        let mut upfront = 0.0;
        let mut monthly = 0.0;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let line = item.prices(&self.catalog)?;
            upfront += line.upfront;
            monthly += line.monthly;
            lines.push(LineSummary {
                label: format!("{} ×{}", line.label, item.qty),
                amount: round2(line.upfront),
            });
        }

        let shipping_cost = ship.calculate_cost();
        let taxable = upfront + if self.config.tax_on_shipping { shipping_cost } else { 0.0 };
        let tax = taxable * self.config.tax_rate;
        let grand = upfront + shipping_cost + tax;

        debug!(lines = lines.len(), upfront, shipping_cost, tax, "Quote computed");
        Ok(Quote {
            currency: self.config.currency.clone(),
            items: lines,
            shipping: LineSummary { label: ship.name.clone(), amount: round2(shipping_cost) },
            tax: LineSummary { label: tax_label(self.config.tax_rate), amount: round2(tax) },
            monthly_total: round2(monthly),
            grand_total: round2(grand),
        })
    }

    /// Recomputes the quote from the request so client-side totals are never
    /// trusted, then issues an order.
    pub fn confirm(&self, request: &QuoteRequest) -> StoreResult<Order> {
        let quote = self.quote(&request.items, request.shipping_option_index)?;
        let order = Order {
            order_id: generate_order_id(&mut rand::thread_rng()),
            status: OrderStatus::Created,
            currency: quote.currency,
            grand_total: quote.grand_total,
            monthly_total: quote.monthly_total,
            created_at: Utc::now(),
        };
        info!(order_id = %order.order_id, grand_total = order.grand_total, monthly_total = order.monthly_total, "Order created");
        Ok(order)
    }
}

/// Whole percent, truncated. `round2` first so 0.29 reads as 29, not 28.
fn tax_label(rate: f64) -> String {
    format!("Tax ({:.0}%)", round2(rate * 100.0).trunc())
}

pub(crate) fn generate_order_id(rng: &mut impl Rng) -> String {
    (0..ORDER_ID_LEN)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}
