use chrono::Duration;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use zpg_common::Shillings;

use crate::{
    db_types::{NewOrder, Order, OrderId},
    helpers::normalize_phone_number,
    traits::CallbackUrls,
    zpe_api::errors::PaymentFlowError,
};

pub const DEFAULT_MINIMUM_AMOUNT: i64 = 1_000;
pub const DEFAULT_BUYER_EMAIL: &str = "customer@example.com";
pub const DEFAULT_BUYER_NAME: &str = "Customer";
pub const DEFAULT_DEDUP_WINDOW_MINUTES: i64 = 10;

/// Business rules applied by [`crate::PaymentFlowApi`].
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub minimum_amount: Shillings,
    /// Used when the purchase request leaves out the buyer's email.
    pub default_buyer_email: String,
    /// Used when the purchase request leaves out the buyer's name.
    pub default_buyer_name: String,
    /// Repeat requests carrying the same idempotency key inside this window return the original order.
    pub dedup_window: Duration,
    pub callbacks: CallbackUrls,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            minimum_amount: Shillings::from(DEFAULT_MINIMUM_AMOUNT),
            default_buyer_email: DEFAULT_BUYER_EMAIL.to_string(),
            default_buyer_name: DEFAULT_BUYER_NAME.to_string(),
            dedup_window: Duration::minutes(DEFAULT_DEDUP_WINDOW_MINUTES),
            callbacks: CallbackUrls::for_base_url("http://127.0.0.1:8370"),
        }
    }
}

/// A purchase as submitted by the client. Nothing is trusted until [`PurchaseRequest::validate`] has run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: Option<Shillings>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts whole-shilling amounts given as a JSON number or a numeric string. Blank strings and `null` count as
/// missing.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<Shillings>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let amount = match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(v), _) => Some(v),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
            _ => return Err(D::Error::custom(format!("{n} is not a whole number of shillings"))),
        },
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(
            s.trim().parse::<i64>().map_err(|_| D::Error::custom(format!("{s} is not a whole number of shillings")))?,
        ),
        Some(v) => return Err(D::Error::custom(format!("Invalid amount: {v}"))),
    };
    Ok(amount.map(Shillings::from))
}

impl PurchaseRequest {
    pub fn new(buyer_phone: &str, amount: Shillings) -> Self {
        Self { buyer_phone: Some(buyer_phone.to_string()), amount: Some(amount), ..Default::default() }
    }

    pub fn with_buyer(mut self, name: &str, email: &str) -> Self {
        self.buyer_name = Some(name.to_string());
        self.buyer_email = Some(email.to_string());
        self
    }

    pub fn with_idempotency_key(mut self, key: &str) -> Self {
        self.idempotency_key = Some(key.to_string());
        self
    }

    /// Checks the request against the business rules in `settings`, filling in default buyer details.
    ///
    /// Checks are made in order: required fields, phone number format, then the minimum amount. The first failure is
    /// returned.
    pub fn validate(&self, settings: &PaymentSettings) -> Result<ValidatedPurchase, PaymentFlowError> {
        let phone = non_blank(&self.buyer_phone);
        let mut missing = Vec::new();
        if phone.is_none() {
            missing.push("buyer_phone");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        let (Some(phone), Some(amount)) = (phone, self.amount) else {
            return Err(PaymentFlowError::MissingFields(missing));
        };
        let buyer_phone =
            normalize_phone_number(phone).ok_or_else(|| PaymentFlowError::InvalidPhoneNumber(phone.to_string()))?;
        if amount < settings.minimum_amount {
            return Err(PaymentFlowError::AmountTooLow(settings.minimum_amount));
        }
        Ok(ValidatedPurchase {
            buyer_phone,
            buyer_email: non_blank(&self.buyer_email).unwrap_or(settings.default_buyer_email.as_str()).to_string(),
            buyer_name: non_blank(&self.buyer_name).unwrap_or(settings.default_buyer_name.as_str()).to_string(),
            amount,
            idempotency_key: non_blank(&self.idempotency_key).map(String::from),
        })
    }
}

/// A purchase request that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPurchase {
    pub buyer_phone: String,
    pub buyer_email: String,
    pub buyer_name: String,
    pub amount: Shillings,
    pub idempotency_key: Option<String>,
}

impl ValidatedPurchase {
    pub fn into_new_order(self, order_id: OrderId) -> NewOrder {
        NewOrder::new(order_id, self.buyer_phone, self.amount)
            .with_buyer(self.buyer_name, self.buyer_email)
            .with_idempotency_key(self.idempotency_key)
    }
}

/// The result of a successful payment initiation.
#[derive(Debug, Clone, PartialEq)]
pub struct InitiatedPayment {
    pub order: Order,
    /// The provider's acknowledgement body.
    pub payment_details: Value,
    /// True if the request matched an earlier order by idempotency key, and the provider was not called again.
    pub duplicate: bool,
}

/// A status report from the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookNotification {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default, alias = "payment_status")]
    pub status: Option<String>,
    #[serde(default, alias = "reference")]
    pub transaction_id: Option<String>,
}

impl WebhookNotification {
    pub fn new(order_id: &str, status: &str) -> Self {
        Self { order_id: Some(order_id.to_string()), status: Some(status.to_string()), transaction_id: None }
    }

    pub fn with_transaction_id(mut self, txid: &str) -> Self {
        self.transaction_id = Some(txid.to_string());
        self
    }

    pub fn order_id(&self) -> Option<OrderId> {
        non_blank(&self.order_id).map(OrderId::from)
    }

    pub fn status(&self) -> Option<&str> {
        non_blank(&self.status)
    }

    pub fn transaction_id(&self) -> Option<&str> {
        non_blank(&self.transaction_id)
    }
}
