use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Duration;
use serde_json::{json, Value};
use zeno_payment_engine::{
    db_types::{NewOrder, OrderStatusType},
    OrderStore,
};
use zpg_common::{Secret, Shillings};

use super::{
    helpers::{get_json, post_json, send, test_api, test_service, TestApi},
    mocks::MockProvider,
};
use crate::{config::WebhookConfig, helpers::calculate_hmac};

async fn with_order(api: &TestApi, order_id: &str) {
    let order = NewOrder::new(order_id.into(), "0754546567".into(), Shillings::from(30_000));
    api.store().insert_order(order, Duration::minutes(10)).await.unwrap();
}

fn hmac_config(secret: &str) -> WebhookConfig {
    WebhookConfig { hmac_checks: true, hmac_secret: Secret::new(secret.to_string()), ..Default::default() }
}

#[actix_web::test]
async fn completed_notification() {
    let api = test_api(MockProvider::new());
    with_order(&api, "order-1").await;
    let service = test_service(api.clone(), WebhookConfig::default()).await;
    let notification = json!({"order_id": "order-1", "payment_status": "COMPLETED", "reference": "0936183435"});
    let (status, body) = post_json(&service, "/api/zeno-webhook", &notification).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment status updated to completed");
    let order = api.store().fetch_order(&"order-1".into()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
    assert_eq!(order.transaction_id.as_deref(), Some("0936183435"));
    // Redelivery is harmless
    let (status, body) = post_json(&service, "/api/zeno-webhook", &notification).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment status is already completed");
}

#[actix_web::test]
async fn stale_status_is_acknowledged_and_ignored() {
    let api = test_api(MockProvider::new());
    with_order(&api, "order-1").await;
    let service = test_service(api.clone(), WebhookConfig::default()).await;
    let (status, _) =
        post_json(&service, "/api/zeno-webhook", &json!({"order_id": "order-1", "status": "failed"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) =
        post_json(&service, "/api/zeno-webhook", &json!({"order_id": "order-1", "status": "pending"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Status 'pending' ignored. Payment is already failed");
    let (_, body) = get_json(&service, "/api/payment-status/order-1").await;
    assert_eq!(body["status"], "failed");
}

#[actix_web::test]
async fn unknown_order() {
    let api = test_api(MockProvider::new());
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) =
        post_json(&service, "/api/zeno-webhook", &json!({"order_id": "order-404", "status": "COMPLETED"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Payment not found");
}

#[actix_web::test]
async fn missing_order_id() {
    let api = test_api(MockProvider::new());
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) = post_json(&service, "/api/zeno-webhook", &json!({"status": "COMPLETED"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing order id");
}

#[actix_web::test]
async fn signed_notification() {
    let api = test_api(MockProvider::new());
    with_order(&api, "order-1").await;
    let service = test_service(api.clone(), hmac_config("secret")).await;
    let payload = r#"{"order_id":"order-1","status":"COMPLETED"}"#;
    let req = TestRequest::post()
        .uri("/api/zeno-webhook")
        .insert_header(("Content-Type", "application/json"))
        .insert_header(("X-Zeno-Signature", calculate_hmac("secret", payload.as_bytes())))
        .set_payload(payload);
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    let order = api.store().fetch_order(&"order-1".into()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
}

#[actix_web::test]
async fn bad_signature() {
    let api = test_api(MockProvider::new());
    with_order(&api, "order-1").await;
    let service = test_service(api.clone(), hmac_config("secret")).await;
    let payload = r#"{"order_id":"order-1","status":"COMPLETED"}"#;
    let req = TestRequest::post()
        .uri("/api/zeno-webhook")
        .insert_header(("Content-Type", "application/json"))
        .insert_header(("X-Zeno-Signature", calculate_hmac("not-the-secret", payload.as_bytes())))
        .set_payload(payload);
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"success": false, "error": "Invalid HMAC signature."}));
    let req = TestRequest::post()
        .uri("/api/zeno-webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload);
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], "No HMAC signature found.");
    let order = api.store().fetch_order(&"order-1".into()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn full_payment_flow() {
    let mut provider = MockProvider::new();
    provider.expect_request_payment().times(1).returning(|_| Ok(json!({"status": "success"})));
    let api = test_api(provider);
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) =
        post_json(&service, "/api/process-payment", &json!({"buyer_phone": "0754546567", "amount": 30000})).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["orderId"].as_str().unwrap().to_string();
    let status_path = format!("/api/payment-status/{order_id}");
    let (_, body) = get_json(&service, &status_path).await;
    assert_eq!(body["status"], "processing");
    let (status, _) = post_json(
        &service,
        "/api/zeno-webhook",
        &json!({"order_id": order_id, "status": "COMPLETED", "transaction_id": "TX-99"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get_json(&service, &status_path).await;
    assert_eq!(body["status"], "completed");
}
