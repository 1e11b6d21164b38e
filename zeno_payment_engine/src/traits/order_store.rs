use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderStatusType, OrderUpdate};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order store backend error. {0}")]
    BackendError(String),
}

#[derive(Debug, Clone)]
pub enum InsertOrderResult {
    /// A new `Pending` order was stored.
    Inserted(Order),
    /// An order with the same idempotency key was created inside the deduplication window. Nothing was stored.
    Existing(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Inserted(o) | Self::Existing(o) => o,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MergeResult {
    /// The update changed the order.
    Updated { old: Order, new: Order },
    /// The order already reflected the update.
    Unchanged(Order),
    /// The requested status would have moved the order backwards (or out of a terminal state), so the status was left
    /// alone. Any other fields in the update were still merged into `order`.
    StaleStatus { order: Order, rejected: OrderStatusType },
}

impl MergeResult {
    /// The order as it is stored after the merge.
    pub fn order(&self) -> &Order {
        match self {
            Self::Updated { new, .. } => new,
            Self::Unchanged(o) => o,
            Self::StaleStatus { order, .. } => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Updated { new, .. } => new,
            Self::Unchanged(o) => o,
            Self::StaleStatus { order, .. } => order,
        }
    }

    /// If the merge moved the order into a new status, returns that status.
    pub fn new_status(&self) -> Option<&OrderStatusType> {
        match self {
            Self::Updated { old, new } if old.status != new.status => Some(&new.status),
            _ => None,
        }
    }

    pub(crate) fn from_merge(old: Order, outcome: crate::db_types::MergeOutcome) -> Self {
        match (outcome.rejected_status, outcome.changed) {
            (Some(rejected), _) => Self::StaleStatus { order: outcome.order, rejected },
            (None, true) => Self::Updated { old, new: outcome.order },
            (None, false) => Self::Unchanged(outcome.order),
        }
    }
}

/// Process-wide keyed order state with create, read and merge-update operations.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// Stores a new order in `Pending` status.
    ///
    /// If the order carries an idempotency key, and an order with the same key was created less than `dedup_window`
    /// ago, that order is returned as [`InsertOrderResult::Existing`] and nothing is stored. The lookup and the insert
    /// are atomic.
    ///
    /// Returns [`OrderStoreError::OrderAlreadyExists`] if the order id is taken.
    async fn insert_order(&self, order: NewOrder, dedup_window: Duration) -> Result<InsertOrderResult, OrderStoreError>;

    /// Fetches the order with the given id, or `None` if there isn't one.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Merges `update` into the stored order, following the rules of [`Order::merge`]. The read, lifecycle check and
    /// write happen atomically.
    ///
    /// Returns [`OrderStoreError::OrderNotFound`] and changes nothing if the order does not exist.
    async fn merge_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<MergeResult, OrderStoreError>;

    /// Detaches the idempotency key from an order, so that the next request with that key creates a new order. The
    /// order itself is left as it is.
    ///
    /// Returns [`OrderStoreError::OrderNotFound`] if the order does not exist.
    async fn release_idempotency_key(&self, order_id: &OrderId) -> Result<(), OrderStoreError>;

    /// Removes all orders created before `cutoff` and returns them.
    async fn remove_orders_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError>;
}
