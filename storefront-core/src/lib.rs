pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod pricing;
pub mod product;
pub mod seed;
pub mod stack;

// Re-export key types for the server crate
pub use cart::{CartItem, CartService, CartStore, CartView, InMemoryCartStore};
pub use catalog::{Catalog, ProductQuery, SortKey};
pub use checkout::{CheckoutService, Order, Quote, QuoteRequest, ShippingOption};
pub use config::{CheckoutConfig, DatabaseSettings};
pub use error::{StoreError, StoreResult};
pub use product::{ItemKind, Product, ProductKind};
