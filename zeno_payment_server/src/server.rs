use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use zeno_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    PaymentFlowApi,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::zenopay::ZenoPayProvider,
    routes::{health, payment_cancelled, payment_success, PaymentStatusRoute, ProcessPaymentRoute, ZenoWebhookRoute},
    store::OrderBackend,
};

pub type ServerPaymentApi = PaymentFlowApi<OrderBackend, ZenoPayProvider>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = OrderBackend::new(config.database_url.as_deref()).await?;
    let provider =
        ZenoPayProvider::new(config.zenopay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(config.event_buffer_size, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers();
    let api = create_payment_api(&config, store, provider, producers);
    if let Some(retention) = config.order_retention {
        let _ = start_expiry_worker(api.clone(), retention);
    }
    info!("🚀️ Starting server on {}:{}. Callbacks will use {}", config.host, config.port, config.base_url());
    let srv = create_server_instance(config, api)?;
    Ok(srv.await?)
}

pub fn create_payment_api(
    config: &ServerConfig,
    store: OrderBackend,
    provider: ZenoPayProvider,
    producers: EventProducers,
) -> web::Data<ServerPaymentApi> {
    web::Data::new(PaymentFlowApi::new(store, provider, config.payment_settings(), producers))
}

/// The server's own reactions to finished payments. Fulfilment is out of our hands, so these just leave a record in
/// the log.
fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_completed(|ev| {
            async move {
                info!(
                    "📬️ Payment for order {} completed. {} paid by {} (ref {})",
                    ev.order.order_id,
                    ev.order.amount,
                    ev.order.buyer_phone,
                    ev.order.transaction_id.as_deref().unwrap_or("n/a")
                );
            }
            .boxed()
        })
        .on_order_failed(|ev| {
            async move {
                warn!(
                    "📬️ Payment for order {} failed. {} from {}",
                    ev.order.order_id, ev.order.amount, ev.order.buyer_phone
                );
            }
            .boxed()
        });
    hooks
}

pub fn create_server_instance(config: ServerConfig, api: web::Data<ServerPaymentApi>) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("zpg::access_log"))
            .app_data(json_config)
            .app_data(api.clone())
            .service(health)
            .service(ProcessPaymentRoute::<OrderBackend, ZenoPayProvider>::new())
            .service(PaymentStatusRoute::<OrderBackend, ZenoPayProvider>::new())
            .service(ZenoWebhookRoute::<OrderBackend, ZenoPayProvider>::new(config.webhook.clone()))
            .service(payment_success)
            .service(payment_cancelled)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
