use std::sync::Arc;

use storefront_core::{seed, CartService, Catalog, CheckoutService, StoreResult};

use crate::config::ServerConfig;

/// Holds the shared state accessible by all request handlers.
///
/// The catalog and cart store synchronize internally, so the state itself is
/// a bundle of `Arc`s that is cheap to clone into every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub catalog: Arc<Catalog>,
    pub carts: CartService,
    pub checkout: Arc<CheckoutService>,
}

impl AppState {
    /// Creates the application state around the demo catalog.
    pub fn new(config: ServerConfig) -> StoreResult<Self> {
        Self::with_catalog(config, seed::catalog())
    }

    pub fn with_catalog(config: ServerConfig, catalog: Catalog) -> StoreResult<Self> {
        let catalog = Arc::new(catalog);
        let checkout = CheckoutService::new(catalog.clone(), seed::shipping_options(), config.checkout.clone())?;
        Ok(AppState {
            config: Arc::new(config),
            carts: CartService::in_memory(catalog.clone()),
            catalog,
            checkout: Arc::new(checkout),
        })
    }
}
