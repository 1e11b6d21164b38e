use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use zpg_common::Shillings;

use crate::db_types::{Order, OrderId};

/// Where the provider should report back to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackUrls {
    /// Receives the asynchronous payment outcome.
    pub webhook: String,
    /// Buyer redirect target after a successful payment.
    pub success: String,
    /// Buyer redirect target after a cancelled payment.
    pub cancel: String,
}

impl CallbackUrls {
    /// Builds the callback urls for a deployment rooted at `base_url`.
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            webhook: format!("{base}/api/zeno-webhook"),
            success: format!("{base}/payment-success"),
            cancel: format!("{base}/payment-cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub buyer_email: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub amount: Shillings,
    pub callbacks: CallbackUrls,
}

impl PaymentRequest {
    pub fn for_order(order: &Order, callbacks: CallbackUrls) -> Self {
        Self {
            order_id: order.order_id.clone(),
            buyer_email: order.buyer_email.clone(),
            buyer_name: order.buyer_name.clone(),
            buyer_phone: order.buyer_phone.clone(),
            amount: order.amount,
            callbacks,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider answered with a non-2xx status. The body is passed through as received.
    #[error("The payment provider rejected the request with status {status}")]
    Rejected { status: u16, body: Value },
    /// The provider could not be reached, or did not answer in time.
    #[error("The payment provider could not be reached. {0}")]
    Unreachable(String),
}

/// The external mobile-money payment API.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Ask the provider to collect payment for an order. On success, the provider's acknowledgement body is returned.
    ///
    /// Implementations must not retry, and must bound the call with a timeout.
    async fn request_payment(&self, request: &PaymentRequest) -> Result<Value, ProviderError>;
}
