//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_default_state(InMemoryStore::new());
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_product(app: &axum::Router, name: &str, price_cents: i64, stock: i32) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/products",
        Some(json!({
            "name": name,
            "category": "Peripherals",
            "price_cents": price_cents,
            "stock_quantity": stock
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn place_order(app: &axum::Router, product_id: &str, quantity: i32) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/orders",
        Some(json!({ "items": [{ "product_id": product_id, "quantity": quantity }] })),
    )
    .await
}

async fn set_status(app: &axum::Router, order_id: &str, status: &str) -> (StatusCode, Value) {
    send(
        app,
        "PUT",
        &format!("/orders/{order_id}/status"),
        Some(json!({ "status": status })),
    )
    .await
}

async fn stock_of(app: &axum::Router, product_id: &str) -> i64 {
    let (status, json) = send(app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    json["stock_quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_product_crud() {
    let app = setup();
    let id = create_product(&app, "Mouse", 39_999, 25).await;

    let (status, json) = send(&app, "GET", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Mouse");
    assert_eq!(json["price_cents"], 39_999);
    assert_eq!(json["stock_quantity"], 25);

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/products/{id}"),
        Some(json!({ "stock_quantity": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stock_quantity"], 30);
    assert_eq!(json["name"], "Mouse");

    let (status, json) = send(&app, "GET", "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(&app, "GET", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_invalid_product_is_rejected() {
    let app = setup();
    let (status, json) = send(
        &app,
        "POST",
        "/products",
        Some(json!({ "name": "Broken", "category": "Test", "price_cents": -1 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_update_missing_product_is_not_found() {
    let app = setup();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/products/{}", uuid::Uuid::new_v4()),
        Some(json!({ "stock_quantity": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/products/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid ID"));

    let (status, _) = send(&app, "GET", "/orders/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = place_order(&app, "not-a-uuid", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_paginated_products() {
    let app = setup();
    for i in 0..3 {
        create_product(&app, &format!("Product {i}"), 100, 1).await;
    }

    let (status, json) = send(&app, "GET", "/products/paginated?page=2&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["page"], 2);
    assert_eq!(json["limit"], 2);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (_, json) = send(&app, "GET", "/products/paginated", None).await;
    assert_eq!(json["limit"], 10);
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = setup();
    let product_id = create_product(&app, "Widget", 100, 10).await;

    let (status, order) = place_order(&app, &product_id, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["total_cents"], 200);
    assert_eq!(order["items"][0]["unit_price_cents"], 100);
    assert_eq!(stock_of(&app, &product_id).await, 10);

    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, json) = set_status(&app, &order_id, "Completed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Completed");
    assert_eq!(stock_of(&app, &product_id).await, 8);

    let (status, json) = set_status(&app, &order_id, "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Cancelled");
    assert_eq!(stock_of(&app, &product_id).await, 10);

    let (status, json) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Cancelled");

    let (status, json) = send(&app, "GET", "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_exceeding_stock_is_rejected() {
    let app = setup();
    let product_id = create_product(&app, "Widget", 100, 5).await;

    let (status, json) = place_order(&app, &product_id, 6).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Insufficient stock"));

    let (_, orders) = send(&app, "GET", "/orders", None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_for_unknown_product_is_not_found() {
    let app = setup();
    let (status, _) = place_order(&app, &uuid::Uuid::new_v4().to_string(), 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_order_is_bad_request() {
    let app = setup();
    let (status, _) = send(&app, "POST", "/orders", Some(json!({ "items": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_bodies_are_bad_request() {
    let app = setup();
    let product_id = create_product(&app, "Widget", 100, 5).await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({ "items": [{ "product_id": product_id }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("quantity"));

    let (status, json) = send(
        &app,
        "POST",
        "/products",
        Some(json!({ "name": "Widget", "category": "Tools", "price_cents": "cheap" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (_, order) = place_order(&app, &product_id, 1).await;
    let order_id = order["id"].as_str().unwrap();
    let (status, json) = send(
        &app,
        "PUT",
        &format!("/orders/{order_id}/status"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/products/{product_id}"),
        Some(json!({ "stock_quantity": "many" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_body_without_json_content_type_is_bad_request() {
    let app = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .body(Body::from(r#"{"items":[]}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlong_product_name_is_bad_request() {
    let app = setup();
    let (status, json) = send(
        &app,
        "POST",
        "/products",
        Some(json!({
            "name": "n".repeat(256),
            "category": "Tools",
            "price_cents": 100
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("255"));
}

#[tokio::test]
async fn test_unknown_status_is_bad_request() {
    let app = setup();
    let product_id = create_product(&app, "Widget", 100, 5).await;
    let (_, order) = place_order(&app, &product_id, 1).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, json) = set_status(&app, order_id, "Shipped").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Shipped"));
}

#[tokio::test]
async fn test_completion_without_stock_is_bad_request() {
    let app = setup();
    let product_id = create_product(&app, "Widget", 100, 5).await;
    let (_, order) = place_order(&app, &product_id, 4).await;
    let order_id = order["id"].as_str().unwrap();

    send(
        &app,
        "PUT",
        &format!("/products/{product_id}"),
        Some(json!({ "stock_quantity": 2 })),
    )
    .await;

    let (status, json) = set_status(&app, order_id, "Completed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Cannot complete"));
    assert_eq!(stock_of(&app, &product_id).await, 2);
}

#[tokio::test]
async fn test_status_of_unknown_order_is_not_found() {
    let app = setup();
    let (status, _) = set_status(&app, &uuid::Uuid::new_v4().to_string(), "Completed").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let product_id = create_product(&app, "Widget", 100, 5).await;
    place_order(&app, &product_id, 1).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_placed"));
}
