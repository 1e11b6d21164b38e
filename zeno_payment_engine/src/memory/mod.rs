//! In-memory order store
//!
//! Orders live for as long as the process does (or until the expiry worker evicts them). All operations take a single
//! lock, which is what makes `merge_order` an atomic compare-and-set on the order status.
use std::{collections::HashMap, fmt::Debug, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::*;
use tokio::sync::RwLock;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderUpdate},
    traits::{InsertOrderResult, MergeResult, OrderStore, OrderStoreError},
};

#[derive(Default)]
struct Orders {
    orders: HashMap<OrderId, Order>,
    /// Index of idempotency key to the most recent order created with it
    by_idempotency_key: HashMap<String, OrderId>,
}

#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    inner: Arc<RwLock<Orders>>,
}

impl Debug for MemoryOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryOrderStore")
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of orders currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl OrderStore for MemoryOrderStore {
    async fn insert_order(&self, order: NewOrder, dedup_window: Duration) -> Result<InsertOrderResult, OrderStoreError> {
        let now = Utc::now();
        let mut lock = self.inner.write().await;
        if let Some(key) = &order.idempotency_key {
            let existing = lock
                .by_idempotency_key
                .get(key)
                .and_then(|id| lock.orders.get(id))
                .filter(|o| o.created_at > now - dedup_window);
            if let Some(existing) = existing {
                debug!("🗃️ Order {} matches idempotency key {key}. Not creating a new order.", existing.order_id);
                return Ok(InsertOrderResult::Existing(existing.clone()));
            }
        }
        if lock.orders.contains_key(&order.order_id) {
            return Err(OrderStoreError::OrderAlreadyExists(order.order_id));
        }
        let order = Order::from_new_order(order, now);
        if let Some(key) = &order.idempotency_key {
            lock.by_idempotency_key.insert(key.clone(), order.order_id.clone());
        }
        lock.orders.insert(order.order_id.clone(), order.clone());
        debug!("🗃️ Order {} has been saved with status {}", order.order_id, order.status);
        Ok(InsertOrderResult::Inserted(order))
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        Ok(self.inner.read().await.orders.get(order_id).cloned())
    }

    async fn merge_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<MergeResult, OrderStoreError> {
        let mut lock = self.inner.write().await;
        let stored = lock.orders.get_mut(order_id).ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        let old = stored.clone();
        let outcome = old.merge(&update, Utc::now());
        if outcome.changed {
            *stored = outcome.order.clone();
            trace!("🗃️ Order {order_id} updated. Status: {} -> {}", old.status, stored.status);
        }
        Ok(MergeResult::from_merge(old, outcome))
    }

    async fn release_idempotency_key(&self, order_id: &OrderId) -> Result<(), OrderStoreError> {
        let mut lock = self.inner.write().await;
        let order = lock.orders.get_mut(order_id).ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        if let Some(key) = order.idempotency_key.take() {
            if lock.by_idempotency_key.get(&key) == Some(order_id) {
                lock.by_idempotency_key.remove(&key);
            }
            debug!("🗃️ Idempotency key {key} released from order {order_id}");
        }
        Ok(())
    }

    async fn remove_orders_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError> {
        let mut lock = self.inner.write().await;
        let stale = lock.orders.values().filter(|o| o.created_at < cutoff).map(|o| o.order_id.clone()).collect::<Vec<_>>();
        let mut removed = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(order) = lock.orders.remove(&id) {
                if let Some(key) = &order.idempotency_key {
                    if lock.by_idempotency_key.get(key) == Some(&id) {
                        lock.by_idempotency_key.remove(key);
                    }
                }
                removed.push(order);
            }
        }
        Ok(removed)
    }
}
