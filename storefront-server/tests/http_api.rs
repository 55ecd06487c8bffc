use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use storefront_server::{build_router, AppState, ServerConfig};

fn app() -> Router {
    let _ = tracing_subscriber::fmt::try_init();
    let state = AppState::new(ServerConfig::default()).expect("default config is valid");
    build_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn health_reports_database_without_password() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["host"], "db");
    assert_eq!(body["database"]["port"], 3306);
    assert_eq!(body["database"]["database"], "hackathon");
    assert!(body["database"].get("password").is_none());
}

#[tokio::test]
async fn lists_active_products_with_filters() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    // The seeded iPhone 14 is inactive.
    assert_eq!(body["total"], 8);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 12);

    let (_, body) = send(&app, Method::GET, "/products?kind=phone&sort=-upfront_price", None).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["items"][0]["sku"], "p-galaxy-s24");

    let (_, body) = send(&app, Method::GET, "/products?q=roaming&network=5G&sort=monthly_fee", None).await;
    let skus: Vec<&str> = body["items"].as_array().unwrap().iter().map(|p| p["sku"].as_str().unwrap()).collect();
    assert_eq!(skus, vec!["plan-plus", "plan-unlimited"]);
}

#[tokio::test]
async fn invalid_pagination_is_a_bad_request() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/products?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("page"));
}

#[tokio::test]
async fn product_crud_round() {
    let app = app();
    let new_phone = json!({
        "kind": "phone",
        "sku": "p-nothing-2",
        "name": "Phone (2)",
        "brand": "Nothing",
        "upfront_price": 599.0
    });

    let (status, body) = send(&app, Method::POST, "/products", Some(new_phone.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["active"], true);

    let (status, _) = send(&app, Method::POST, "/products", Some(new_phone)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        send(&app, Method::PATCH, "/products/p-nothing-2", Some(json!({ "upfront_price": 549.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upfront_price"], 549.0);

    let (status, _) = send(&app, Method::PATCH, "/products/p-nothing-2", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::DELETE, "/products/p-nothing-2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, Method::GET, "/products/p-nothing-2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found: p-nothing-2");
}

#[tokio::test]
async fn bulk_upsert_brands_and_networks() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/products/bulk",
        Some(json!({ "items": [
            { "kind": "plan", "sku": "plan-travel", "name": "Travel", "network": "LTE", "monthly_fee": 12.5 },
            { "kind": "watch", "sku": "w-1", "name": "Watch" }
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upserted"], 1);

    let (_, brands) = send(&app, Method::GET, "/products/brands", None).await;
    assert_eq!(brands, json!(["Apple", "Fairphone", "Google", "Samsung"]));

    let (_, networks) = send(&app, Method::GET, "/products/networks", None).await;
    assert_eq!(networks, json!(["4G", "5G", "LTE"]));
}

#[tokio::test]
async fn cart_flow_through_quote() {
    let app = app();

    let (status, body) =
        send(&app, Method::POST, "/cart/s1/items", Some(json!({ "sku": "p-pixel-8", "kind": "phone" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["item_count"], 1);

    let (_, body) = send(
        &app,
        Method::POST,
        "/cart/s1/items",
        Some(json!({ "sku": "p-iphone-15|plan-basic", "kind": "bundle", "qty": 1 })),
    )
    .await;
    assert_eq!(body["items"][1]["label"], "iPhone 15 + Basic 10GB");
    assert_eq!(body["totals"]["upfront_total"], 1498.0);
    assert_eq!(body["totals"]["monthly_total"], 15.0);
    assert_eq!(body["totals"]["item_count"], 2);

    let (status, quote) = send(&app, Method::POST, "/cart/s1/quote", Some(json!({ "shipping_option_index": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["items"][1]["label"], "iPhone 15 + Basic 10GB ×1");
    assert_eq!(quote["tax"]["amount"], 120.24);
    assert_eq!(quote["grand_total"], 1623.23);
    assert_eq!(quote["monthly_total"], 15.0);

    let (_, body) = send(
        &app,
        Method::PUT,
        "/cart/s1/items",
        Some(json!({ "sku": "p-pixel-8", "kind": "phone", "qty": 0 })),
    )
    .await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::DELETE, "/cart/s1/items/bundle/p-iphone-15%7Cplan-basic", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, Method::POST, "/cart/s1/quote", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");
}

#[tokio::test]
async fn cart_rejects_bad_input() {
    let app = app();

    let (status, _) =
        send(&app, Method::POST, "/cart/s1/items", Some(json!({ "sku": "p-pixel-8", "kind": "phone", "qty": 0 })))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&app, Method::POST, "/cart/s1/items", Some(json!({ "sku": "p-iphone-14", "kind": "phone" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&app, Method::POST, "/cart/s1/items", Some(json!({ "sku": "plan-basic", "kind": "phone" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/cart/s1/items/tablet/t-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid kind: tablet");

    let (_, body) = send(&app, Method::DELETE, "/cart/s1", None).await;
    assert_eq!(body["totals"]["item_count"], 0);
}

#[tokio::test]
async fn checkout_quote_and_confirm() {
    let app = app();

    let (_, options) = send(&app, Method::GET, "/shipping-options", None).await;
    assert_eq!(options.as_array().unwrap().len(), 3);
    assert_eq!(options[1]["index"], 1);
    assert_eq!(options[1]["name"], "Express");

    let request = json!({
        "items": [{ "sku": "p-fairphone-5", "kind": "phone", "qty": 2 }],
        "shipping_option_index": 2
    });
    let (status, quote) = send(&app, Method::POST, "/checkout/quote", Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["currency"], "EUR");
    assert_eq!(quote["items"][0]["amount"], 1098.0);
    assert_eq!(quote["grand_total"], 1185.84);

    let (status, order) = send(&app, Method::POST, "/checkout/confirm", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "created");
    assert_eq!(order["grand_total"], 1185.84);
    assert_eq!(order["order_id"].as_str().unwrap().len(), 12);

    let (status, body) = send(
        &app,
        Method::POST,
        "/checkout/quote",
        Some(json!({ "items": [{ "sku": "p-pixel-8", "kind": "phone" }], "shipping_option_index": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid shipping option: 7");

    let (status, _) =
        send(&app, Method::POST, "/checkout/confirm", Some(json!({ "items": [], "shipping_option_index": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_requests_get_json_bad_request() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/products",
        Some(json!({ "kind": "tablet", "sku": "t-1", "name": "Tab" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("tablet"));

    let (status, body) =
        send(&app, Method::POST, "/cart/s1/items", Some(json!({ "sku": "w-1", "kind": "watch" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/checkout/quote",
        Some(json!({ "items": [{ "sku": "p-pixel-8", "kind": "phone" }], "shipping_option_index": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/products?sort=price", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_content_type_gets_json_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/checkout/quote")
        .body(Body::from(r#"{"items": []}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Content-Type"));
}
