//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (the order store, calls to ZenoPay) must be awaited, never
//! blocked on.
use std::marker::PhantomData;

use actix_web::{dev::HttpServiceFactory, get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use zeno_payment_engine::{
    db_types::OrderId,
    MergeResult,
    OrderStore,
    PaymentFlowApi,
    PaymentProvider,
    PurchaseRequest,
    WebhookNotification,
};

use crate::{
    config::WebhookConfig,
    data_objects::{JsonResponse, LandingPageParams, PaymentInitiatedResponse, PaymentStatusResponse},
    errors::ServerError,
    helpers::idempotency_key_from_headers,
    middleware::{HmacMiddlewareFactory, SignatureCheck},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(process_payment => Post "/api/process-payment" impl OrderStore, PaymentProvider);
/// Route handler for starting a payment.
///
/// The body is a JSON [`PurchaseRequest`]: `buyer_phone` and `amount` are required, `buyer_email`, `buyer_name` and
/// `idempotency_key` are optional. The idempotency key may also be sent in the `Idempotency-Key` header.
///
/// On success, the response carries the new order id and ZenoPay's acknowledgement:
/// `{"success": true, "orderId": "order-...", "paymentDetails": {...}}`. The buyer then gets a prompt on their phone,
/// and the client should poll `/api/payment-status/{orderId}`.
pub async fn process_payment<S, P>(
    req: HttpRequest,
    body: web::Json<PurchaseRequest>,
    api: web::Data<PaymentFlowApi<S, P>>,
) -> Result<HttpResponse, ServerError>
where
    S: OrderStore,
    P: PaymentProvider,
{
    let mut purchase = body.into_inner();
    if purchase.idempotency_key.is_none() {
        purchase.idempotency_key = idempotency_key_from_headers(&req);
    }
    debug!("💻️ POST process-payment for {:?}", purchase.buyer_phone);
    let payment = api.initiate_payment(purchase).await.map_err(|e| {
        debug!("💻️ Payment could not be started. {e}");
        ServerError::from(e)
    })?;
    let response = PaymentInitiatedResponse::new(payment.order.order_id, payment.payment_details);
    Ok(HttpResponse::Ok().json(response))
}

route!(payment_status => Get "/api/payment-status/{order_id}" impl OrderStore, PaymentProvider);
/// Route handler for status polls. Read only.
///
/// Returns `{"success": true, "orderId": "...", "status": "pending", "timestamp": "..."}`, or a 404 if the order is
/// unknown.
pub async fn payment_status<S, P>(
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<S, P>>,
) -> Result<HttpResponse, ServerError>
where
    S: OrderStore,
    P: PaymentProvider,
{
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ GET payment-status for {order_id}");
    let order = api.payment_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(PaymentStatusResponse::from(order)))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
/// The ZenoPay webhook route. Like the routes generated by [`route!`], but the resource is wrapped in the HMAC
/// middleware, which needs its configuration at registration time.
pub struct ZenoWebhookRoute<S, P> {
    config: WebhookConfig,
    _phantom: PhantomData<fn() -> (S, P)>,
}

impl<S, P> ZenoWebhookRoute<S, P> {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config, _phantom: PhantomData }
    }
}

impl<S, P> HttpServiceFactory for ZenoWebhookRoute<S, P>
where
    S: OrderStore + 'static,
    P: PaymentProvider + 'static,
{
    fn register(self, config: &mut actix_web::dev::AppService) {
        let hmac = HmacMiddlewareFactory::new(SignatureCheck::from(&self.config));
        let res = actix_web::Resource::new("/api/zeno-webhook")
            .name("zeno_webhook")
            .guard(actix_web::guard::Post())
            .to(zeno_webhook::<S, P>)
            .wrap(hmac);
        HttpServiceFactory::register(res, config);
    }
}

/// Route handler for ZenoPay's payment notifications.
///
/// The body carries `order_id`, `status` (or `payment_status`) and optionally `transaction_id` (or `reference`).
/// Any notification for a known order is acknowledged with a 200, including ones that are ignored because the order
/// has already moved past the reported status, so that ZenoPay does not keep retrying them.
pub async fn zeno_webhook<S, P>(
    body: web::Json<WebhookNotification>,
    api: web::Data<PaymentFlowApi<S, P>>,
) -> Result<HttpResponse, ServerError>
where
    S: OrderStore,
    P: PaymentProvider,
{
    let notification = body.into_inner();
    info!("💻️ Received payment notification for order {:?}: {:?}", notification.order_id, notification.status);
    let result = api.process_webhook(notification).await?;
    let message = match &result {
        MergeResult::Updated { new, .. } => format!("Payment status updated to {}", new.status),
        MergeResult::Unchanged(order) => format!("Payment status is already {}", order.status),
        MergeResult::StaleStatus { order, rejected } => {
            format!("Status '{rejected}' ignored. Payment is already {}", order.status)
        },
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

//----------------------------------------------   Landing pages  ----------------------------------------------------
#[get("/payment-success")]
pub async fn payment_success(query: web::Query<LandingPageParams>) -> impl Responder {
    trace!("💻️ Buyer landed on the payment success page. {:?}", query.order_id);
    landing_page("Payment successful", "Thank you! Your payment has been received.", query.order_id.as_deref())
}

#[get("/payment-cancelled")]
pub async fn payment_cancelled(query: web::Query<LandingPageParams>) -> impl Responder {
    trace!("💻️ Buyer landed on the payment cancelled page. {:?}", query.order_id);
    landing_page(
        "Payment cancelled",
        "Your payment was cancelled. You have not been charged, and you can try again at any time.",
        query.order_id.as_deref(),
    )
}

fn landing_page(title: &str, message: &str, order_id: Option<&str>) -> HttpResponse {
    let reference = order_id
        .map(|id| format!("<p>Order reference: <code>{}</code></p>", escape_html(id)))
        .unwrap_or_default();
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head><body><h1>{title}</h1><p>\
         {message}</p>{reference}<p><a href=\"/\">Back to the shop</a></p></body></html>"
    );
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html)
}

fn escape_html(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            c => c.to_string(),
        })
        .collect()
}
