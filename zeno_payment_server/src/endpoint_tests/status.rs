use actix_web::http::StatusCode;
use chrono::Duration;
use zeno_payment_engine::{db_types::NewOrder, OrderStore};
use zpg_common::Shillings;

use super::{
    helpers::{get_json, test_api, test_service},
    mocks::MockProvider,
};
use crate::config::WebhookConfig;

#[actix_web::test]
async fn status_of_unknown_order() {
    let api = test_api(MockProvider::new());
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) = get_json(&service, "/api/payment-status/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Payment not found");
}

#[actix_web::test]
async fn status_of_pending_order() {
    let api = test_api(MockProvider::new());
    let order = NewOrder::new("order-1".into(), "0754546567".into(), Shillings::from(5_000));
    let order = api.store().insert_order(order, Duration::minutes(10)).await.unwrap().order().clone();
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) = get_json(&service, "/api/payment-status/order-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["orderId"], "order-1");
    assert_eq!(body["status"], "pending");
    let timestamp = body["timestamp"].as_str().expect("timestamp missing");
    let timestamp = chrono::DateTime::parse_from_rfc3339(timestamp).expect("timestamp is not RFC 3339");
    assert_eq!(timestamp, order.updated_at);
}

#[actix_web::test]
async fn health_check() {
    let api = test_api(MockProvider::new());
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) = get_json(&service, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}
