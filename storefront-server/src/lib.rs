// Declare modules to be part of the library crate

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ServerConfig;
pub use state::AppState;

/// Builds the HTTP API around the shared state.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Routes for /products
        .route("/products", get(handlers::list_products).post(handlers::create_product))
        .route("/products/bulk", post(handlers::bulk_upsert_products))
        .route("/products/brands", get(handlers::list_brands))
        .route("/products/networks", get(handlers::list_networks))
        .route(
            "/products/:sku",
            get(handlers::get_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        // Routes for /cart/:session
        .route("/cart/:session", get(handlers::view_cart).delete(handlers::clear_cart))
        .route(
            "/cart/:session/items",
            post(handlers::add_cart_item).put(handlers::update_cart_item),
        )
        .route(
            "/cart/:session/items/:kind/:sku",
            axum::routing::delete(handlers::remove_cart_item),
        )
        .route("/cart/:session/quote", post(handlers::quote_cart))
        // Checkout
        .route("/shipping-options", get(handlers::list_shipping_options))
        .route("/checkout/quote", post(handlers::quote))
        .route("/checkout/confirm", post(handlers::confirm))
        // Add middleware
        .layer(TraceLayer::new_for_http()) // Log requests/responses
        .layer(CorsLayer::permissive()) // Frontend dev server runs on another origin
        .with_state(app_state)
}
