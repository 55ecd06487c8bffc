//! Demo data the server starts with.

use crate::catalog::Catalog;
use crate::checkout::ShippingOption;
use crate::product::{PhoneProduct, PlanProduct, Product};
use tracing::warn;

fn phone(sku: &str, name: &str, brand: &str, price: f64, highlights: &[&str], active: bool) -> Product {
    Product::Phone(PhoneProduct {
        sku: sku.to_string(),
        name: name.to_string(),
        brand: brand.to_string(),
        upfront_price: price,
        description: format!("{} {}", brand, name),
        highlights: highlights.iter().map(|h| h.to_string()).collect(),
        active,
        image_url: None,
    })
}

fn plan(sku: &str, name: &str, network: Option<&str>, fee: f64, data_gb: Option<u32>, highlights: &[&str]) -> Product {
    Product::Plan(PlanProduct {
        sku: sku.to_string(),
        name: name.to_string(),
        network: network.map(str::to_string),
        monthly_fee: fee,
        data_gb,
        description: String::new(),
        highlights: highlights.iter().map(|h| h.to_string()).collect(),
        active: true,
    })
}

pub fn products() -> Vec<Product> {
    vec![
        phone("p-iphone-15", "iPhone 15", "Apple", 799.0, &["A16 Bionic", "USB-C"], true),
        phone("p-iphone-14", "iPhone 14", "Apple", 599.0, &["A15 Bionic"], false),
        phone("p-galaxy-s24", "Galaxy S24", "Samsung", 849.0, &["Galaxy AI", "120Hz display"], true),
        phone("p-pixel-8", "Pixel 8", "Google", 699.0, &["Tensor G3", "7 years of updates"], true),
        phone("p-fairphone-5", "Fairphone 5", "Fairphone", 549.0, &["Replaceable battery"], true),
        plan("plan-basic", "Basic 10GB", Some("4G"), 15.0, Some(10), &["Unlimited calls"]),
        plan("plan-plus", "Plus 50GB", Some("5G"), 25.0, Some(50), &["Unlimited calls", "EU roaming"]),
        plan("plan-unlimited", "Unlimited", Some("5G"), 39.99, None, &["Unlimited data", "EU roaming"]),
        plan("plan-flex", "Flex Prepaid", None, 9.99, Some(5), &["No contract"]),
    ]
}

pub fn catalog() -> Catalog {
    let catalog = Catalog::new();
    for product in products() {
        let sku = product.sku().to_string();
        if let Err(e) = catalog.create(product) {
            warn!(sku = %sku, error = %e, "Skipping seed product");
        }
    }
    catalog
}

pub fn shipping_options() -> Vec<ShippingOption> {
    vec![
        ShippingOption::new("Standard", 4.99, 4),
        ShippingOption::new("Express", 9.99, 1),
        ShippingOption::new("Store pickup", 0.0, 0),
    ]
}
