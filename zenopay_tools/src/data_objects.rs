use serde::{Deserialize, Serialize};
use zpg_common::Shillings;

/// The body of a mobile-money order request. ZenoPay pushes a USSD prompt for `amount` to `buyer_phone`, and reports
/// the outcome to `webhook_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileMoneyOrder {
    pub order_id: String,
    pub buyer_email: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub amount: Shillings,
    pub webhook_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}
