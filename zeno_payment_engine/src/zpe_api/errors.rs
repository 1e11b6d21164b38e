use serde_json::Value;
use thiserror::Error;
use zpg_common::Shillings;

use crate::{db_types::OrderId, traits::OrderStoreError};

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("Minimum amount is {0}")]
    AmountTooLow(Shillings),
    #[error("Missing order id")]
    MissingOrderId,
    #[error("Payment not found")]
    OrderNotFound(OrderId),
    #[error("Payment processing failed")]
    ProviderRejected { order_id: OrderId, status: u16, body: Value },
    #[error("No response from payment processor")]
    ProviderUnreachable { order_id: OrderId, reason: String },
    #[error("Order store error. {0}")]
    StoreError(String),
}

impl From<OrderStoreError> for PaymentFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            e => Self::StoreError(e.to_string()),
        }
    }
}
