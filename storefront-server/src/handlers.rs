use crate::error::ServerResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::{
    AddItemRequest, BulkUpsertRequest, BulkUpsertResponse, CartQuoteRequest, DatabaseInfo, HealthResponse,
    ProductListResponse, ShippingOptionResponse, UpdateItemRequest,
};
use crate::state::AppState;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use storefront_core::{CartView, ItemKind, Order, Product, ProductQuery, Quote, QuoteRequest};
use tracing::{debug, info};

/// Handler for `GET /health`
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = &state.config.database;
    Json(HealthResponse {
        status: "ok",
        products: state.catalog.count(),
        database: DatabaseInfo {
            host: db.host.clone(),
            port: db.port,
            database: db.database.clone(),
            user: db.user.clone(),
        },
    })
}

// --- Catalog ---

/// Handler for `GET /products`
/// Lists active products matching the query parameters.
#[axum::debug_handler]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductQuery>,
) -> ServerResult<Json<ProductListResponse>> {
    debug!(?query, "Received request to list products");
    let (items, total) = state.catalog.list(&query)?;
    Ok(Json(ProductListResponse { items, total, page: query.page, page_size: query.page_size }))
}

/// Handler for `GET /products/{sku}`
#[axum::debug_handler]
pub async fn get_product(State(state): State<AppState>, AppPath(sku): AppPath<String>) -> ServerResult<Json<Product>> {
    Ok(Json(state.catalog.get(&sku)?))
}

/// Handler for `POST /products`
#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Product>,
) -> ServerResult<impl IntoResponse> {
    info!(sku = %payload.sku(), kind = ?payload.kind(), "Received request to create product");
    let created = state.catalog.create(payload)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for `PATCH /products/{sku}`
/// Applies a partial update; the body is any subset of product fields.
#[axum::debug_handler]
pub async fn update_product(
    State(state): State<AppState>,
    AppPath(sku): AppPath<String>,
    AppJson(updates): AppJson<Value>,
) -> ServerResult<Json<Product>> {
    info!(sku = %sku, "Received request to update product");
    Ok(Json(state.catalog.update(&sku, updates)?))
}

/// Handler for `DELETE /products/{sku}`
#[axum::debug_handler]
pub async fn delete_product(State(state): State<AppState>, AppPath(sku): AppPath<String>) -> ServerResult<StatusCode> {
    info!(sku = %sku, "Received request to delete product");
    state.catalog.delete(&sku)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /products/bulk`
#[axum::debug_handler]
pub async fn bulk_upsert_products(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkUpsertRequest>,
) -> ServerResult<Json<BulkUpsertResponse>> {
    info!(count = payload.items.len(), "Received bulk upsert request");
    let upserted = state.catalog.upsert_many(payload.items)?;
    Ok(Json(BulkUpsertResponse { upserted }))
}

/// Handler for `GET /products/brands`
#[axum::debug_handler]
pub async fn list_brands(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.brands())
}

/// Handler for `GET /products/networks`
#[axum::debug_handler]
pub async fn list_networks(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.networks())
}

// --- Cart ---

/// Handler for `GET /cart/{session}`
#[axum::debug_handler]
pub async fn view_cart(State(state): State<AppState>, AppPath(session): AppPath<String>) -> ServerResult<Json<CartView>> {
    Ok(Json(state.carts.view(&session).await?))
}

/// Handler for `POST /cart/{session}/items`
/// Adds `qty` (default 1) of an item to the cart.
#[axum::debug_handler]
pub async fn add_cart_item(
    State(state): State<AppState>,
    AppPath(session): AppPath<String>,
    AppJson(payload): AppJson<AddItemRequest>,
) -> ServerResult<Json<CartView>> {
    debug!(session = %session, sku = %payload.sku, kind = %payload.kind, qty = payload.qty, "Received add-to-cart request");
    Ok(Json(state.carts.add(&session, &payload.sku, payload.kind, payload.qty).await?))
}

/// Handler for `PUT /cart/{session}/items`
/// Sets a line's quantity; zero removes it.
#[axum::debug_handler]
pub async fn update_cart_item(
    State(state): State<AppState>,
    AppPath(session): AppPath<String>,
    AppJson(payload): AppJson<UpdateItemRequest>,
) -> ServerResult<Json<CartView>> {
    debug!(session = %session, sku = %payload.sku, kind = %payload.kind, qty = payload.qty, "Received cart update request");
    Ok(Json(state.carts.update_qty(&session, &payload.sku, payload.kind, payload.qty).await?))
}

/// Handler for `DELETE /cart/{session}/items/{kind}/{sku}`
#[axum::debug_handler]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    AppPath((session, kind, sku)): AppPath<(String, String, String)>,
) -> ServerResult<Json<CartView>> {
    let kind: ItemKind = kind.parse()?;
    Ok(Json(state.carts.remove(&session, &sku, kind).await?))
}

/// Handler for `DELETE /cart/{session}`
#[axum::debug_handler]
pub async fn clear_cart(State(state): State<AppState>, AppPath(session): AppPath<String>) -> ServerResult<Json<CartView>> {
    Ok(Json(state.carts.clear(&session).await?))
}

/// Handler for `POST /cart/{session}/quote`
/// Quotes whatever is currently in the session's cart.
#[axum::debug_handler]
pub async fn quote_cart(
    State(state): State<AppState>,
    AppPath(session): AppPath<String>,
    AppJson(payload): AppJson<CartQuoteRequest>,
) -> ServerResult<Json<Quote>> {
    let items = state.carts.items(&session).await?;
    debug!(session = %session, lines = items.len(), "Quoting session cart");
    Ok(Json(state.checkout.quote(&items, payload.shipping_option_index)?))
}

// --- Checkout ---

/// Handler for `GET /shipping-options`
#[axum::debug_handler]
pub async fn list_shipping_options(State(state): State<AppState>) -> Json<Vec<ShippingOptionResponse>> {
    let options = state
        .checkout
        .shipping_options()
        .iter()
        .enumerate()
        .map(|(index, option)| ShippingOptionResponse {
            index,
            name: option.name.clone(),
            cost: option.calculate_cost(),
            estimated_days: option.estimated_days,
        })
        .collect();
    Json(options)
}

/// Handler for `POST /checkout/quote`
#[axum::debug_handler]
pub async fn quote(State(state): State<AppState>, AppJson(payload): AppJson<QuoteRequest>) -> ServerResult<Json<Quote>> {
    debug!(lines = payload.items.len(), shipping = payload.shipping_option_index, "Received quote request");
    Ok(Json(state.checkout.quote(&payload.items, payload.shipping_option_index)?))
}

/// Handler for `POST /checkout/confirm`
/// Recomputes the quote server-side and issues an order.
#[axum::debug_handler]
pub async fn confirm(
    State(state): State<AppState>,
    AppJson(payload): AppJson<QuoteRequest>,
) -> ServerResult<(StatusCode, Json<Order>)> {
    let order = state.checkout.confirm(&payload)?;
    Ok((StatusCode::CREATED, Json(order)))
}
