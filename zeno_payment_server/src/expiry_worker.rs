use actix_web::web;
use chrono::Duration;
use log::*;
use tokio::task::JoinHandle;
use zeno_payment_engine::{db_types::Order, PaymentFlowApi};

use crate::{integrations::zenopay::ZenoPayProvider, store::OrderBackend};

const EXPIRY_JOB_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Starts the expiry worker, which removes orders created more than `retention` ago.
/// Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_expiry_worker(
    api: web::Data<PaymentFlowApi<OrderBackend, ZenoPayProvider>>,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(EXPIRY_JOB_INTERVAL);
        info!("🕰️ Order expiry worker started. Orders are kept for {} hours", retention.num_hours());
        loop {
            timer.tick().await;
            trace!("🕰️ Running order expiry job");
            match api.expire_orders(retention).await {
                Ok(removed) if removed.is_empty() => trace!("🕰️ No orders expired"),
                Ok(removed) => {
                    info!("🕰️ {} orders expired", removed.len());
                    debug!("🕰️ Expired orders: {}", order_list(&removed));
                },
                Err(e) => {
                    error!("🕰️ Error running order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] {} {}", o.order_id, o.status, o.amount))
        .collect::<Vec<String>>()
        .join(", ")
}
