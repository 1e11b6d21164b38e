use actix_http::Request;
use actix_web::{
    body::to_bytes,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use log::debug;
use serde_json::Value;
use zeno_payment_engine::{events::EventProducers, MemoryOrderStore, PaymentFlowApi, PaymentSettings};

use super::mocks::MockProvider;
use crate::{
    config::WebhookConfig,
    errors::ServerError,
    routes::{health, payment_cancelled, payment_success, PaymentStatusRoute, ProcessPaymentRoute, ZenoWebhookRoute},
};

pub type TestApi = PaymentFlowApi<MemoryOrderStore, MockProvider>;

pub fn test_api(provider: MockProvider) -> web::Data<TestApi> {
    let _ = env_logger::try_init().ok();
    web::Data::new(PaymentFlowApi::new(
        MemoryOrderStore::new(),
        provider,
        PaymentSettings::default(),
        EventProducers::default(),
    ))
}

/// Builds the app the same way the server does, minus the access logger.
pub async fn test_service(
    api: web::Data<TestApi>,
    webhook: WebhookConfig,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
    let app = App::new()
        .app_data(json_config)
        .app_data(api)
        .service(health)
        .service(ProcessPaymentRoute::<MemoryOrderStore, MockProvider>::new())
        .service(PaymentStatusRoute::<MemoryOrderStore, MockProvider>::new())
        .service(ZenoWebhookRoute::<MemoryOrderStore, MockProvider>::new(webhook))
        .service(payment_success)
        .service(payment_cancelled);
    test::init_service(app).await
}

/// Sends a request and returns the status and body. Errors raised by middleware are rendered the way the server would.
pub async fn send<S>(service: &S, req: TestRequest) -> (StatusCode, String)
where S: Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    match test::try_call_service(service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            debug!("Request failed in middleware: {e}");
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub async fn post_json<S>(service: &S, path: &str, body: &Value) -> (StatusCode, Value)
where S: Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let req = TestRequest::post().uri(path).set_json(body);
    let (status, body) = send(service, req).await;
    (status, serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

pub async fn get_json<S>(service: &S, path: &str) -> (StatusCode, Value)
where S: Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let (status, body) = send(service, TestRequest::get().uri(path)).await;
    (status, serde_json::from_str(&body).unwrap_or(Value::String(body)))
}
