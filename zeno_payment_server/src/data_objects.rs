use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeno_payment_engine::db_types::{Order, OrderId, OrderStatusType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Response to `POST /api/process-payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiatedResponse {
    pub success: bool,
    pub order_id: OrderId,
    /// ZenoPay's acknowledgement, passed through as received.
    pub payment_details: Value,
}

impl PaymentInitiatedResponse {
    pub fn new(order_id: OrderId, payment_details: Value) -> Self {
        Self { success: true, order_id, payment_details }
    }
}

/// Response to `GET /api/payment-status/{order_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub status: OrderStatusType,
    /// When the order last changed.
    pub timestamp: DateTime<Utc>,
}

impl From<Order> for PaymentStatusResponse {
    fn from(order: Order) -> Self {
        Self { success: true, order_id: order.order_id, status: order.status, timestamp: order.updated_at }
    }
}

/// Query string for the buyer landing pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandingPageParams {
    #[serde(default, alias = "orderId")]
    pub order_id: Option<String>,
}
