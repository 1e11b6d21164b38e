use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use zeno_payment_engine::{db_types::OrderStatusType, traits::ProviderError, OrderStore};
use zpg_common::Shillings;

use super::{
    helpers::{post_json, send, test_api, test_service},
    mocks::MockProvider,
};
use crate::{config::WebhookConfig, helpers::IDEMPOTENCY_KEY_HEADER};

fn accepting_provider(times: usize) -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_request_payment().times(times).returning(|req| {
        Ok(json!({
            "status": "success",
            "message": "Request in progress. You will receive a callback shortly",
            "order_id": req.order_id.as_str(),
        }))
    });
    provider
}

#[actix_web::test]
async fn process_payment() {
    let mut provider = MockProvider::new();
    provider
        .expect_request_payment()
        .withf(|req| {
            req.amount == Shillings::from(30_000) &&
                req.buyer_phone == "0754546567" &&
                req.buyer_email == "customer@example.com" &&
                req.callbacks.webhook == "http://127.0.0.1:8370/api/zeno-webhook"
        })
        .times(1)
        .returning(|req| Ok(json!({"status": "success", "order_id": req.order_id.as_str()})));
    let api = test_api(provider);
    let service = test_service(api.clone(), WebhookConfig::default()).await;
    let (status, body) =
        post_json(&service, "/api/process-payment", &json!({"buyer_phone": "0754546567", "amount": 30000})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let order_id = body["orderId"].as_str().expect("orderId missing");
    assert!(order_id.starts_with("order-"));
    assert_eq!(body["paymentDetails"]["status"], "success");
    assert_eq!(body["paymentDetails"]["order_id"], order_id);
    let order = api.store().fetch_order(&order_id.into()).await.unwrap().expect("Order was not saved");
    assert_eq!(order.status, OrderStatusType::Processing);
    assert_eq!(order.buyer_name, "Customer");
}

#[actix_web::test]
async fn amount_below_minimum() {
    let api = test_api(accepting_provider(0));
    let service = test_service(api.clone(), WebhookConfig::default()).await;
    let (status, body) = post_json(
        &service,
        "/api/process-payment",
        &json!({"buyer_phone": "0754546567", "amount": 500, "buyer_name": "Asha"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Minimum amount is 1000 Tsh");
    assert!(api.store().is_empty().await);
}

#[actix_web::test]
async fn missing_fields() {
    let api = test_api(accepting_provider(0));
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) = post_json(&service, "/api/process-payment", &json!({"buyer_email": "a@b.co.tz"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["details"]["missing"], json!(["buyer_phone", "amount"]));
}

#[actix_web::test]
async fn invalid_phone_number() {
    let api = test_api(accepting_provider(0));
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) =
        post_json(&service, "/api/process-payment", &json!({"buyer_phone": "12345", "amount": 5000})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid phone number");
}

#[actix_web::test]
async fn malformed_body() {
    let api = test_api(accepting_provider(0));
    let service = test_service(api, WebhookConfig::default()).await;
    let req = TestRequest::post()
        .uri("/api/process-payment")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"buyer_phone\": ");
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Invalid request body");
}

#[actix_web::test]
async fn provider_rejection_is_passed_through() {
    let mut provider = MockProvider::new();
    provider.expect_request_payment().times(1).returning(|_| {
        Err(ProviderError::Rejected { status: 401, body: json!({"status": "error", "message": "Invalid API key"}) })
    });
    let api = test_api(provider);
    let service = test_service(api.clone(), WebhookConfig::default()).await;
    let (status, body) =
        post_json(&service, "/api/process-payment", &json!({"buyer_phone": "+255754546567", "amount": "2500"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Payment processing failed");
    assert_eq!(body["details"]["message"], "Invalid API key");
    // The order is kept, but never leaves pending
    assert_eq!(api.store().len().await, 1);
}

#[actix_web::test]
async fn provider_unreachable() {
    let mut provider = MockProvider::new();
    provider
        .expect_request_payment()
        .times(1)
        .returning(|_| Err(ProviderError::Unreachable("operation timed out".into())));
    let api = test_api(provider);
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) =
        post_json(&service, "/api/process-payment", &json!({"buyer_phone": "0654546567", "amount": 1000})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "No response from payment processor");
}

#[actix_web::test]
async fn idempotency_key_in_header() {
    let api = test_api(accepting_provider(1));
    let service = test_service(api.clone(), WebhookConfig::default()).await;
    let purchase = json!({"buyer_phone": "0754546567", "amount": 30000});
    let mut order_ids = Vec::new();
    for _ in 0..2 {
        let req = TestRequest::post()
            .uri("/api/process-payment")
            .insert_header((IDEMPOTENCY_KEY_HEADER, "checkout-7781"))
            .set_json(&purchase);
        let (status, body) = send(&service, req).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        order_ids.push(body["orderId"].as_str().unwrap().to_string());
    }
    assert_eq!(order_ids[0], order_ids[1]);
    assert_eq!(api.store().len().await, 1);
}

#[actix_web::test]
async fn idempotency_key_in_body() {
    let api = test_api(accepting_provider(2));
    let service = test_service(api.clone(), WebhookConfig::default()).await;
    let first = json!({"buyer_phone": "0754546567", "amount": 30000, "idempotency_key": "a"});
    let second = json!({"buyer_phone": "0754546567", "amount": 30000, "idempotency_key": "b"});
    let (_, a1) = post_json(&service, "/api/process-payment", &first).await;
    let (_, b) = post_json(&service, "/api/process-payment", &second).await;
    let (_, a2) = post_json(&service, "/api/process-payment", &first).await;
    assert_eq!(a1["orderId"], a2["orderId"]);
    assert_ne!(a1["orderId"], b["orderId"]);
    assert_eq!(api.store().len().await, 2);
}
