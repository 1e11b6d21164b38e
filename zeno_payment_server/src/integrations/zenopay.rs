//! Binds the ZenoPay client to the payment engine's [`PaymentProvider`] contract.
use log::*;
use serde_json::Value;
use zenopay_tools::{MobileMoneyOrder, ZenoPayApi, ZenoPayApiError, ZenoPayConfig};
use zeno_payment_engine::{
    traits::PaymentRequest,
    PaymentProvider,
    ProviderError,
};

#[derive(Clone)]
pub struct ZenoPayProvider {
    api: ZenoPayApi,
}

impl ZenoPayProvider {
    pub fn new(config: ZenoPayConfig) -> Result<Self, ZenoPayApiError> {
        let api = ZenoPayApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentProvider for ZenoPayProvider {
    async fn request_payment(&self, request: &PaymentRequest) -> Result<Value, ProviderError> {
        let order = mobile_money_order(request);
        self.api.create_order(&order).await.map_err(|e| {
            debug!("💸️ ZenoPay request for order {} failed. {e}", request.order_id);
            provider_error(e)
        })
    }
}

pub fn mobile_money_order(request: &PaymentRequest) -> MobileMoneyOrder {
    MobileMoneyOrder {
        order_id: request.order_id.to_string(),
        buyer_email: request.buyer_email.clone(),
        buyer_name: request.buyer_name.clone(),
        buyer_phone: request.buyer_phone.clone(),
        amount: request.amount,
        webhook_url: request.callbacks.webhook.clone(),
        success_url: Some(request.callbacks.success.clone()),
        cancel_url: Some(request.callbacks.cancel.clone()),
    }
}

/// Rejections keep ZenoPay's status and body. The body is relayed as JSON where possible. Everything else means the
/// buyer was never prompted.
pub fn provider_error(e: ZenoPayApiError) -> ProviderError {
    match e {
        ZenoPayApiError::Rejected { status, body } => {
            let body = serde_json::from_str(&body).unwrap_or(Value::String(body));
            ProviderError::Rejected { status, body }
        },
        ZenoPayApiError::Timeout => ProviderError::Unreachable("ZenoPay did not answer in time".to_string()),
        e => ProviderError::Unreachable(e.to_string()),
    }
}
