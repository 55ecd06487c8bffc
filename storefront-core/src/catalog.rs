use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::product::{Product, ProductKind};

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 100;

/// Sort orders accepted by [`Catalog::list`]. A leading `-` means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "-name")]
    NameDesc,
    #[serde(rename = "upfront_price")]
    UpfrontPrice,
    #[serde(rename = "-upfront_price")]
    UpfrontPriceDesc,
    #[serde(rename = "monthly_fee")]
    MonthlyFee,
    #[serde(rename = "-monthly_fee")]
    MonthlyFeeDesc,
}

impl SortKey {
    fn is_descending(&self) -> bool {
        matches!(self, SortKey::NameDesc | SortKey::UpfrontPriceDesc | SortKey::MonthlyFeeDesc)
    }

    /// Ascending comparison on the sorted attribute. Products lacking a
    /// numeric attribute compare as +infinity.
    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            SortKey::Name | SortKey::NameDesc => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
            SortKey::UpfrontPrice | SortKey::UpfrontPriceDesc => {
                let ka = a.upfront_price().unwrap_or(f64::INFINITY);
                let kb = b.upfront_price().unwrap_or(f64::INFINITY);
                ka.total_cmp(&kb)
            }
            SortKey::MonthlyFee | SortKey::MonthlyFeeDesc => {
                let ka = a.monthly_fee().unwrap_or(f64::INFINITY);
                let kb = b.monthly_fee().unwrap_or(f64::INFINITY);
                ka.total_cmp(&kb)
            }
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Filters, ordering and pagination for a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring searched in name, brand, network,
    /// description and highlights.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub kind: Option<ProductKind>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub min_upfront: Option<f64>,
    #[serde(default)]
    pub max_upfront: Option<f64>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            q: None,
            kind: None,
            brand: None,
            network: None,
            min_upfront: None,
            max_upfront: None,
            sort: SortKey::Name,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductQuery {
    pub fn validate(&self) -> StoreResult<()> {
        if self.page == 0 {
            return Err(StoreError::InvalidArgument("page must be >= 1".to_string()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(StoreError::InvalidArgument(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    fn matches(&self, product: &Product) -> bool {
        if !product.is_active() {
            return false;
        }
        if let Some(kind) = self.kind {
            if product.kind() != kind {
                return false;
            }
        }
        if let Product::Phone(phone) = product {
            if let Some(brand) = non_blank(&self.brand) {
                if !same_text(&phone.brand, brand) {
                    return false;
                }
            }
            if let Some(min) = self.min_upfront {
                if phone.upfront_price < min {
                    return false;
                }
            }
            if let Some(max) = self.max_upfront {
                if phone.upfront_price > max {
                    return false;
                }
            }
        }
        if let Product::Plan(plan) = product {
            // Plans without a network are not excluded by a network filter.
            if let (Some(wanted), Some(network)) = (non_blank(&self.network), plan.network.as_deref()) {
                if !network.is_empty() && !same_text(network, wanted) {
                    return false;
                }
            }
        }
        if let Some(q) = non_blank(&self.q) {
            if !product.search_text().contains(&q.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive comparison matching the free-text search's folding.
fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Thread-safe, in-memory product catalog keyed by sku.
#[derive(Debug, Default)]
pub struct Catalog {
    products: RwLock<BTreeMap<String, Product>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from already-validated products. Later duplicates
    /// replace earlier ones.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> StoreResult<Self> {
        let mut map = BTreeMap::new();
        for product in products {
            product.validate()?;
            map.insert(product.sku().to_string(), product);
        }
        Ok(Catalog { products: RwLock::new(map) })
    }

    /// Returns one page of matching products and the total number of matches.
    pub fn list(&self, query: &ProductQuery) -> StoreResult<(Vec<Product>, usize)> {
        query.validate()?;
        let products = self.products.read();

        let mut items: Vec<&Product> = products.values().filter(|p| query.matches(p)).collect();
        let sort = query.sort;
        if sort.is_descending() {
            items.sort_by(|a, b| sort.compare(b, a));
        } else {
            items.sort_by(|a, b| sort.compare(a, b));
        }

        let total = items.len();
        let start = (query.page - 1).saturating_mul(query.page_size);
        let page: Vec<Product> = items
            .into_iter()
            .skip(start)
            .take(query.page_size)
            .cloned()
            .collect();
        debug!(total, returned = page.len(), page = query.page, "Catalog listing computed");
        Ok((page, total))
    }

    pub fn get(&self, sku: &str) -> StoreResult<Product> {
        self.products
            .read()
            .get(sku)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(sku.to_string()))
    }

    pub fn create(&self, product: Product) -> StoreResult<Product> {
        product.validate()?;
        let mut products = self.products.write();
        if products.contains_key(product.sku()) {
            return Err(StoreError::AlreadyExists(product.sku().to_string()));
        }
        products.insert(product.sku().to_string(), product.clone());
        info!(sku = %product.sku(), kind = ?product.kind(), "Product created");
        Ok(product)
    }

    /// Merges `updates` (a JSON object) over the stored product and
    /// revalidates the result. The kind may change; the sku may not.
    pub fn update(&self, sku: &str, updates: Value) -> StoreResult<Product> {
        let Value::Object(updates) = updates else {
            return Err(StoreError::InvalidArgument("updates must be a JSON object".to_string()));
        };
        if let Some(new_sku) = updates.get("sku") {
            if new_sku.as_str() != Some(sku) {
                return Err(StoreError::InvalidArgument("sku cannot be changed".to_string()));
            }
        }

        let mut products = self.products.write();
        let existing = products.get(sku).ok_or_else(|| StoreError::NotFound(sku.to_string()))?;

        let mut data = serde_json::to_value(existing)?;
        if let Value::Object(fields) = &mut data {
            fields.extend(updates);
        }
        let updated: Product =
            serde_json::from_value(data).map_err(|e| StoreError::InvalidProduct(e.to_string()))?;
        updated.validate()?;

        products.insert(sku.to_string(), updated.clone());
        info!(sku, kind = ?updated.kind(), "Product updated");
        Ok(updated)
    }

    /// Creates or replaces many products at once. Entries without a known
    /// `kind` are skipped; any other invalid entry rejects the whole batch.
    pub fn upsert_many(&self, items: Vec<Value>) -> StoreResult<usize> {
        let mut parsed = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            let kind = item.get("kind").and_then(Value::as_str);
            if !matches!(kind, Some("phone") | Some("plan")) {
                debug!(position, ?kind, "Skipping bulk entry with unknown kind");
                continue;
            }
            let product: Product = serde_json::from_value(item)
                .map_err(|e| StoreError::InvalidProduct(format!("entry {}: {}", position, e)))?;
            product.validate()?;
            parsed.push(product);
        }

        let count = parsed.len();
        let mut products = self.products.write();
        for product in parsed {
            products.insert(product.sku().to_string(), product);
        }
        info!(count, "Products upserted");
        Ok(count)
    }

    pub fn delete(&self, sku: &str) -> StoreResult<()> {
        match self.products.write().remove(sku) {
            Some(_) => {
                info!(sku, "Product deleted");
                Ok(())
            }
            None => Err(StoreError::NotFound(sku.to_string())),
        }
    }

    pub fn count(&self) -> usize {
        self.products.read().len()
    }

    /// Sorted, distinct brands of all phones (active or not).
    pub fn brands(&self) -> Vec<String> {
        let products = self.products.read();
        let brands: BTreeSet<&str> = products.values().filter_map(Product::brand).collect();
        brands.into_iter().map(str::to_string).collect()
    }

    /// Sorted, distinct non-empty networks of all plans.
    pub fn networks(&self) -> Vec<String> {
        let products = self.products.read();
        let networks: BTreeSet<&str> = products
            .values()
            .filter_map(Product::network)
            .filter(|n| !n.is_empty())
            .collect();
        networks.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{PhoneProduct, PlanProduct};
    use serde_json::json;

    fn phone(sku: &str, name: &str, brand: &str, price: f64) -> Product {
        Product::Phone(PhoneProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            brand: brand.to_string(),
            upfront_price: price,
            description: String::new(),
            highlights: vec![],
            active: true,
            image_url: None,
        })
    }

    fn plan(sku: &str, name: &str, network: Option<&str>, fee: f64) -> Product {
        Product::Plan(PlanProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            network: network.map(str::to_string),
            monthly_fee: fee,
            data_gb: None,
            description: String::new(),
            highlights: vec!["Unlimited calls".to_string()],
            active: true,
        })
    }

    fn catalog() -> Catalog {
        Catalog::with_products(vec![
            phone("p-a", "Zeta Phone", "Acme", 300.0),
            phone("p-b", "alpha Phone", "Bolt", 100.0),
            phone("p-c", "Mid Phone", "acme", 200.0),
            plan("plan-x", "Basic", Some("4G"), 10.0),
            plan("plan-y", "Max", Some("5G"), 30.0),
            plan("plan-z", "Any", None, 20.0),
        ])
        .unwrap()
    }

    fn skus(items: &[Product]) -> Vec<&str> {
        items.iter().map(Product::sku).collect()
    }

    #[test]
    fn default_listing_sorts_by_name_case_insensitively() {
        let (items, total) = catalog().list(&ProductQuery::default()).unwrap();
        assert_eq!(total, 6);
        assert_eq!(skus(&items), vec!["p-b", "plan-z", "plan-x", "plan-y", "p-c", "p-a"]);
    }

    #[test]
    fn brand_filter_is_case_insensitive_and_phones_only() {
        let query = ProductQuery { brand: Some("ACME".to_string()), ..Default::default() };
        let (items, total) = catalog().list(&query).unwrap();
        // Plans carry no brand, so the brand filter does not apply to them.
        assert_eq!(total, 5);
        assert!(!skus(&items).contains(&"p-b"));
    }

    #[test]
    fn brand_and_network_filters_fold_unicode_case() {
        let catalog = Catalog::with_products(vec![
            phone("p-u", "Umlaut Phone", "Äpple", 100.0),
            plan("plan-u", "Über", Some("Ünet"), 10.0),
        ])
        .unwrap();

        let query = ProductQuery { kind: Some(ProductKind::Phone), brand: Some("äPPLE".to_string()), ..Default::default() };
        assert_eq!(catalog.list(&query).unwrap().1, 1);

        let query = ProductQuery { kind: Some(ProductKind::Plan), network: Some("ÜNET".to_string()), ..Default::default() };
        assert_eq!(catalog.list(&query).unwrap().1, 1);
    }

    #[test]
    fn price_range_is_inclusive() {
        let query = ProductQuery {
            kind: Some(ProductKind::Phone),
            min_upfront: Some(100.0),
            max_upfront: Some(200.0),
            sort: SortKey::UpfrontPrice,
            ..Default::default()
        };
        let (items, _) = catalog().list(&query).unwrap();
        assert_eq!(skus(&items), vec!["p-b", "p-c"]);
    }

    #[test]
    fn network_filter_keeps_plans_without_network() {
        let query = ProductQuery {
            kind: Some(ProductKind::Plan),
            network: Some("5g".to_string()),
            ..Default::default()
        };
        let (items, _) = catalog().list(&query).unwrap();
        assert_eq!(skus(&items), vec!["plan-z", "plan-y"]);
    }

    #[test]
    fn missing_sort_attribute_sorts_last_ascending_first_descending() {
        let asc = ProductQuery { sort: SortKey::MonthlyFee, ..Default::default() };
        let (items, _) = catalog().list(&asc).unwrap();
        assert_eq!(&skus(&items)[..3], &["plan-x", "plan-z", "plan-y"]);

        let desc = ProductQuery { sort: SortKey::MonthlyFeeDesc, ..Default::default() };
        let (items, _) = catalog().list(&desc).unwrap();
        assert_eq!(&skus(&items)[3..], &["plan-y", "plan-z", "plan-x"]);
    }

    #[test]
    fn free_text_searches_highlights() {
        let query = ProductQuery { q: Some("unlimited".to_string()), ..Default::default() };
        let (_, total) = catalog().list(&query).unwrap();
        assert_eq!(total, 3);
    }

    #[test]
    fn pagination_reports_total_before_slicing() {
        let query = ProductQuery { page: 2, page_size: 4, ..Default::default() };
        let (items, total) = catalog().list(&query).unwrap();
        assert_eq!(total, 6);
        assert_eq!(items.len(), 2);

        let beyond = ProductQuery { page: 9, page_size: 4, ..Default::default() };
        let (items, total) = catalog().list(&beyond).unwrap();
        assert_eq!(total, 6);
        assert!(items.is_empty());
    }

    #[test]
    fn invalid_pagination_is_rejected() {
        let query = ProductQuery { page: 0, ..Default::default() };
        assert!(matches!(catalog().list(&query), Err(StoreError::InvalidArgument(_))));
        let query = ProductQuery { page_size: 101, ..Default::default() };
        assert!(catalog().list(&query).is_err());
    }

    #[test]
    fn inactive_products_are_hidden_from_listing_but_gettable() {
        let catalog = catalog();
        catalog.update("p-a", json!({ "active": false })).unwrap();
        let (_, total) = catalog.list(&ProductQuery::default()).unwrap();
        assert_eq!(total, 5);
        assert!(!catalog.get("p-a").unwrap().is_active());
    }

    #[test]
    fn create_rejects_duplicate_sku() {
        let catalog = catalog();
        let err = catalog.create(phone("p-a", "Again", "Acme", 1.0)).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(sku) if sku == "p-a"));
    }

    #[test]
    fn update_merges_and_revalidates() {
        let catalog = catalog();
        let updated = catalog.update("p-a", json!({ "upfront_price": 250.0 })).unwrap();
        assert_eq!(updated.upfront_price(), Some(250.0));
        assert_eq!(updated.name(), "Zeta Phone");

        let err = catalog.update("p-a", json!({ "upfront_price": -5.0 })).unwrap_err();
        assert!(matches!(err, StoreError::InvalidProduct(_)));
        assert_eq!(catalog.get("p-a").unwrap().upfront_price(), Some(250.0));
    }

    #[test]
    fn update_can_change_kind_when_fields_fit() {
        let catalog = catalog();
        let err = catalog.update("p-a", json!({ "kind": "plan" })).unwrap_err();
        assert!(matches!(err, StoreError::InvalidProduct(_)));

        let updated = catalog.update("p-a", json!({ "kind": "plan", "monthly_fee": 15.0 })).unwrap();
        assert_eq!(updated.kind(), ProductKind::Plan);
    }

    #[test]
    fn update_rejects_sku_change_and_missing_product() {
        let catalog = catalog();
        assert!(matches!(
            catalog.update("p-a", json!({ "sku": "p-other" })),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(catalog.update("p-nope", json!({})), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn upsert_many_skips_unknown_kinds() {
        let catalog = Catalog::new();
        let count = catalog
            .upsert_many(vec![
                json!({ "kind": "phone", "sku": "p-1", "name": "One", "brand": "Acme", "upfront_price": 1.0 }),
                json!({ "kind": "tablet", "sku": "t-1", "name": "Tab" }),
                json!({ "sku": "x-1" }),
                json!({ "kind": "plan", "sku": "plan-1", "name": "Plan", "monthly_fee": 5.0 }),
            ])
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(catalog.count(), 2);
    }

    #[test]
    fn upsert_many_is_atomic_on_invalid_entry() {
        let catalog = Catalog::new();
        let result = catalog.upsert_many(vec![
            json!({ "kind": "phone", "sku": "p-1", "name": "One", "brand": "Acme", "upfront_price": 1.0 }),
            json!({ "kind": "plan", "sku": "plan-1", "name": "Plan" }),
        ]);
        assert!(result.is_err());
        assert_eq!(catalog.count(), 0);
    }

    #[test]
    fn delete_and_count() {
        let catalog = catalog();
        catalog.delete("p-a").unwrap();
        assert_eq!(catalog.count(), 5);
        assert!(matches!(catalog.delete("p-a"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn brands_and_networks_are_sorted_and_distinct() {
        let catalog = catalog();
        assert_eq!(catalog.brands(), vec!["Acme", "Bolt", "acme"]);
        assert_eq!(catalog.networks(), vec!["4G", "5G"]);
    }

    #[test]
    fn query_deserializes_sort_keys() {
        let query: ProductQuery = serde_json::from_value(json!({ "sort": "-upfront_price" })).unwrap();
        assert_eq!(query.sort, SortKey::UpfrontPriceDesc);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
    }
}
