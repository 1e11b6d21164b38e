use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// Fired once, when the provider reports that an order has been paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCompletedEvent {
    pub order: Order,
}

impl OrderCompletedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired once, when the provider reports that payment for an order failed or was cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
}

impl OrderFailedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
