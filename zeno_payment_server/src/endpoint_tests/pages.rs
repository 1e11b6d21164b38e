use actix_web::{http::StatusCode, test::TestRequest};

use super::{
    helpers::{send, test_api, test_service},
    mocks::MockProvider,
};
use crate::config::WebhookConfig;

#[actix_web::test]
async fn landing_pages() {
    let api = test_api(MockProvider::new());
    let service = test_service(api, WebhookConfig::default()).await;
    let (status, body) = send(&service, TestRequest::get().uri("/payment-success?orderId=order-abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment successful"));
    assert!(body.contains("order-abc"));
    let (status, body) = send(&service, TestRequest::get().uri("/payment-cancelled")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment cancelled"));
    assert!(!body.contains("Order reference"));
}

#[actix_web::test]
async fn order_reference_is_escaped() {
    let api = test_api(MockProvider::new());
    let service = test_service(api, WebhookConfig::default()).await;
    let (_, body) = send(&service, TestRequest::get().uri("/payment-success?order_id=%3Cscript%3E")).await;
    assert!(body.contains("&lt;script&gt;"));
    assert!(!body.contains("<script>"));
}
