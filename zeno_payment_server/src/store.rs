//! The order store the server runs with, chosen at start-up from the configuration.
use chrono::{DateTime, Duration, Utc};
use log::*;
use zeno_payment_engine::{
    db_types::{NewOrder, Order, OrderId, OrderUpdate},
    InsertOrderResult,
    MemoryOrderStore,
    MergeResult,
    OrderStore,
    OrderStoreError,
    SqliteOrderStore,
};

use crate::errors::ServerError;

const SQLITE_MAX_CONNECTIONS: u32 = 25;

#[derive(Debug, Clone)]
pub enum OrderBackend {
    Memory(MemoryOrderStore),
    Sqlite(SqliteOrderStore),
}

impl OrderBackend {
    /// Opens the SQLite store at `database_url` if one is given, or else starts an empty in-memory store.
    pub async fn new(database_url: Option<&str>) -> Result<Self, ServerError> {
        match database_url {
            Some(url) => {
                let store = SqliteOrderStore::new_with_url(url, SQLITE_MAX_CONNECTIONS)
                    .await
                    .map_err(|e| ServerError::InitializeError(e.to_string()))?;
                Ok(Self::Sqlite(store))
            },
            None => {
                info!("🗃️ Using the in-memory order store. Orders will be lost when the server stops.");
                Ok(Self::Memory(MemoryOrderStore::new()))
            },
        }
    }
}

impl OrderStore for OrderBackend {
    async fn insert_order(&self, order: NewOrder, dedup_window: Duration) -> Result<InsertOrderResult, OrderStoreError> {
        match self {
            Self::Memory(store) => store.insert_order(order, dedup_window).await,
            Self::Sqlite(store) => store.insert_order(order, dedup_window).await,
        }
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        match self {
            Self::Memory(store) => store.fetch_order(order_id).await,
            Self::Sqlite(store) => store.fetch_order(order_id).await,
        }
    }

    async fn merge_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<MergeResult, OrderStoreError> {
        match self {
            Self::Memory(store) => store.merge_order(order_id, update).await,
            Self::Sqlite(store) => store.merge_order(order_id, update).await,
        }
    }

    async fn release_idempotency_key(&self, order_id: &OrderId) -> Result<(), OrderStoreError> {
        match self {
            Self::Memory(store) => store.release_idempotency_key(order_id).await,
            Self::Sqlite(store) => store.release_idempotency_key(order_id).await,
        }
    }

    async fn remove_orders_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError> {
        match self {
            Self::Memory(store) => store.remove_orders_created_before(cutoff).await,
            Self::Sqlite(store) => store.remove_orders_created_before(cutoff).await,
        }
    }
}
