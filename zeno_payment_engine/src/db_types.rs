use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Type;
use zpg_common::Shillings;

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh order id of the form `order-<unix millis>-<6 random characters>`.
    pub fn random() -> Self {
        let suffix = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect::<String>();
        Self(format!("order-{}-{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The lifecycle of an order.
///
/// Orders only move forward:
///
/// | From \ To  | Pending | Processing | Completed | Failed | Other |
/// |------------|---------|------------|-----------|--------|-------|
/// | Pending    | -       | ✅️         | ✅️        | ✅️     | ✅️    |
/// | Processing | ❌️      | -          | ✅️        | ✅️     | ✅️    |
/// | Other      | ❌️      | ❌️         | ✅️        | ✅️     | ✅️    |
/// | Completed  | ❌️      | ❌️         | -         | ❌️     | ❌️    |
/// | Failed     | ❌️      | ❌️         | ❌️        | -      | ❌️    |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatusType {
    /// The order has been registered, but the provider has not acknowledged it yet.
    Pending,
    /// The provider accepted the order and has prompted the buyer.
    Processing,
    /// The provider reported a successful payment.
    Completed,
    /// The provider reported that the payment did not go through.
    Failed,
    /// Any other status string reported by the provider, kept verbatim.
    Other(String),
}

impl OrderStatusType {
    /// Maps a status string reported by the provider onto the order lifecycle. Unrecognised values are passed through
    /// as [`OrderStatusType::Other`].
    pub fn from_provider_status(status: &str) -> Self {
        let status = status.trim();
        match status.to_ascii_lowercase().as_str() {
            "success" | "completed" => Self::Completed,
            "failed" | "failure" | "cancelled" | "canceled" => Self::Failed,
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            _ => Self::Other(status.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// True if the order may move from this status to `next`. Staying in the same status is not a transition and
    /// returns false.
    pub fn can_transition_to(&self, next: &OrderStatusType) -> bool {
        use OrderStatusType::*;
        if self == next {
            return false;
        }
        match (self, next) {
            (Completed | Failed, _) => false,
            (Pending, _) => true,
            (Processing, Pending) => false,
            (Processing, _) => true,
            (Other(_), Pending | Processing) => false,
            (Other(_), _) => true,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Failed => write!(f, "failed"),
            OrderStatusType::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatusType> for String {
    fn from(value: OrderStatusType) -> Self {
        value.to_string()
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub buyer_email: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub amount: Shillings,
    /// The provider's reference for the payment, attached when the webhook reports it.
    pub transaction_id: Option<String>,
    /// The provider's acknowledgement of the order request.
    pub provider_response: Option<Value>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a `Pending` order from a new order request, stamped with `now`.
    pub fn from_new_order(order: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            order_id: order.order_id,
            status: OrderStatusType::Pending,
            buyer_email: order.buyer_email,
            buyer_name: order.buyer_name,
            buyer_phone: order.buyer_phone,
            amount: order.amount,
            transaction_id: None,
            provider_response: None,
            idempotency_key: order.idempotency_key,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `update` into a copy of this order.
    ///
    /// Status changes are only applied if they follow the lifecycle (see [`OrderStatusType`]). The other fields in the
    /// update are merged regardless. `updated_at` is only touched if something actually changed.
    pub fn merge(&self, update: &OrderUpdate, now: DateTime<Utc>) -> MergeOutcome {
        let mut new_order = self.clone();
        let mut rejected = None;
        if let Some(status) = &update.status {
            if self.status.can_transition_to(status) {
                new_order.status = status.clone();
            } else if &self.status != status {
                rejected = Some(status.clone());
            }
        }
        if let Some(txid) = &update.transaction_id {
            new_order.transaction_id = Some(txid.clone());
        }
        if let Some(response) = &update.provider_response {
            new_order.provider_response = Some(response.clone());
        }
        let changed = new_order != *self;
        if changed {
            new_order.updated_at = now;
        }
        MergeOutcome { order: new_order, changed, rejected_status: rejected }
    }
}

/// The result of [`Order::merge`].
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub order: Order,
    pub changed: bool,
    pub rejected_status: Option<OrderStatusType>,
}

//--------------------------------------        NewOrder        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub buyer_email: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub amount: Shillings,
    pub idempotency_key: Option<String>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, buyer_phone: String, amount: Shillings) -> Self {
        Self {
            order_id,
            buyer_email: String::default(),
            buyer_name: String::default(),
            buyer_phone,
            amount,
            idempotency_key: None,
        }
    }

    pub fn with_buyer(mut self, name: String, email: String) -> Self {
        self.buyer_name = name;
        self.buyer_email = email;
        self
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }
}

impl Display for NewOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} for {} ({})", self.order_id, self.buyer_phone, self.amount)
    }
}

//--------------------------------------      OrderUpdate      ---------------------------------------------------------
/// A partial update to an order. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
    pub transaction_id: Option<String>,
    pub provider_response: Option<Value>,
}

impl OrderUpdate {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_transaction_id<S: Into<String>>(mut self, txid: S) -> Self {
        self.transaction_id = Some(txid.into());
        self
    }

    pub fn with_provider_response(mut self, response: Value) -> Self {
        self.provider_response = Some(response);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.transaction_id.is_none() && self.provider_response.is_none()
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn pending_order() -> Order {
        let new_order = NewOrder::new("order-1".into(), "0754546567".into(), Shillings::from(30_000));
        Order::from_new_order(new_order, Utc::now() - Duration::minutes(5))
    }

    #[test]
    fn random_order_ids() {
        let id = OrderId::random();
        let parts = id.as_str().split('-').collect::<Vec<_>>();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "order");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert_ne!(OrderId::random(), OrderId::random());
    }

    #[test]
    fn provider_status_mapping() {
        use OrderStatusType::*;
        assert_eq!(OrderStatusType::from_provider_status("success"), Completed);
        assert_eq!(OrderStatusType::from_provider_status("COMPLETED"), Completed);
        assert_eq!(OrderStatusType::from_provider_status("Failed"), Failed);
        assert_eq!(OrderStatusType::from_provider_status("processing"), Processing);
        assert_eq!(OrderStatusType::from_provider_status("USSD_SENT"), Other("USSD_SENT".into()));
        assert_eq!(OrderStatusType::from_provider_status("successful"), Other("successful".into()));
    }

    #[test]
    fn status_serialization() {
        let s = serde_json::to_string(&OrderStatusType::Completed).unwrap();
        assert_eq!(s, r#""completed""#);
        let s = serde_json::to_string(&OrderStatusType::Other("USSD_SENT".into())).unwrap();
        assert_eq!(s, r#""USSD_SENT""#);
        let status: OrderStatusType = serde_json::from_str(r#""processing""#).unwrap();
        assert_eq!(status, OrderStatusType::Processing);
    }

    #[test]
    fn transitions_only_move_forward() {
        use OrderStatusType::*;
        let other = Other("USSD_SENT".into());
        assert!(Pending.can_transition_to(&Processing));
        assert!(Pending.can_transition_to(&Completed));
        assert!(Processing.can_transition_to(&other));
        assert!(other.can_transition_to(&Failed));
        assert!(!Processing.can_transition_to(&Pending));
        assert!(!other.can_transition_to(&Processing));
        assert!(!Completed.can_transition_to(&Failed));
        assert!(!Failed.can_transition_to(&Completed));
        assert!(!Completed.can_transition_to(&Completed));
    }

    #[test]
    fn merge_applies_forward_transitions() {
        let order = pending_order();
        let now = Utc::now();
        let update = OrderUpdate::default().with_status(OrderStatusType::Completed).with_transaction_id("TX123");
        let outcome = order.merge(&update, now);
        assert!(outcome.changed);
        assert!(outcome.rejected_status.is_none());
        assert_eq!(outcome.order.status, OrderStatusType::Completed);
        assert_eq!(outcome.order.transaction_id.as_deref(), Some("TX123"));
        assert_eq!(outcome.order.updated_at, now);
        assert_eq!(outcome.order.created_at, order.created_at);
    }

    #[test]
    fn identical_merge_is_a_no_op() {
        let order = pending_order();
        let update = OrderUpdate::default().with_status(OrderStatusType::Completed).with_transaction_id("TX123");
        let first = order.merge(&update, Utc::now()).order;
        let second = first.merge(&update, Utc::now() + Duration::seconds(5));
        assert!(!second.changed);
        assert_eq!(second.order, first);
    }

    #[test]
    fn stale_status_is_rejected_but_fields_merge() {
        let mut order = pending_order();
        order.status = OrderStatusType::Completed;
        let update =
            OrderUpdate::default().with_status(OrderStatusType::Processing).with_provider_response(json!({"a": 1}));
        let outcome = order.merge(&update, Utc::now());
        assert_eq!(outcome.order.status, OrderStatusType::Completed);
        assert_eq!(outcome.rejected_status, Some(OrderStatusType::Processing));
        assert_eq!(outcome.order.provider_response, Some(json!({"a": 1})));
        assert!(outcome.changed);
    }
}
