//! SQLite order store
//!
//! A single-file durable alternative to [`crate::MemoryOrderStore`]. It keeps the same contract; in particular each
//! insert and merge runs inside a transaction that holds the database write lock from its first statement.
mod orders;

use std::{fmt::Debug, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderUpdate},
    traits::{InsertOrderResult, MergeResult, OrderStore, OrderStoreError},
};

#[derive(Debug, Error)]
pub enum SqliteOrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] MigrateError),
    #[error("Order record is corrupt. {0}")]
    CorruptRecord(String),
}

impl From<SqliteOrderStoreError> for OrderStoreError {
    fn from(e: SqliteOrderStoreError) -> Self {
        OrderStoreError::BackendError(e.to_string())
    }
}

#[derive(Clone)]
pub struct SqliteOrderStore {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteOrderStore ({})", self.url)
    }
}

impl SqliteOrderStore {
    /// Connects to (creating if necessary) the database at `url`, and brings its schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteOrderStoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
        sqlx::migrate!("./src/sqlite/migrations").run(&pool).await?;
        info!("🗃️ Connected to order database at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl OrderStore for SqliteOrderStore {
    async fn insert_order(&self, order: NewOrder, dedup_window: Duration) -> Result<InsertOrderResult, OrderStoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(SqliteOrderStoreError::from)?;
        orders::take_write_lock(&mut tx).await?;
        if let Some(key) = &order.idempotency_key {
            if let Some(existing) = orders::fetch_order_by_idempotency_key(key, now - dedup_window, &mut tx).await? {
                debug!("🗃️ Order {} matches idempotency key {key}. Not creating a new order.", existing.order_id);
                tx.commit().await.map_err(SqliteOrderStoreError::from)?;
                return Ok(InsertOrderResult::Existing(existing));
            }
        }
        if orders::fetch_order(&order.order_id, &mut tx).await?.is_some() {
            return Err(OrderStoreError::OrderAlreadyExists(order.order_id));
        }
        let order = Order::from_new_order(order, now);
        orders::insert_order(&order, &mut tx).await?;
        tx.commit().await.map_err(SqliteOrderStoreError::from)?;
        debug!("🗃️ Order {} has been saved with status {}", order.order_id, order.status);
        Ok(InsertOrderResult::Inserted(order))
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteOrderStoreError::from)?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn merge_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<MergeResult, OrderStoreError> {
        let mut tx = self.pool.begin().await.map_err(SqliteOrderStoreError::from)?;
        orders::take_write_lock(&mut tx).await?;
        let old = orders::fetch_order(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        let outcome = old.merge(&update, Utc::now());
        if outcome.changed {
            orders::update_order(&outcome.order, &mut tx).await?;
            trace!("🗃️ Order {order_id} updated. Status: {} -> {}", old.status, outcome.order.status);
        }
        tx.commit().await.map_err(SqliteOrderStoreError::from)?;
        Ok(MergeResult::from_merge(old, outcome))
    }

    async fn release_idempotency_key(&self, order_id: &OrderId) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteOrderStoreError::from)?;
        if orders::clear_idempotency_key(order_id, &mut conn).await? == 0 {
            return Err(OrderStoreError::OrderNotFound(order_id.clone()));
        }
        debug!("🗃️ Idempotency key released from order {order_id}");
        Ok(())
    }

    async fn remove_orders_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError> {
        let mut tx = self.pool.begin().await.map_err(SqliteOrderStoreError::from)?;
        orders::take_write_lock(&mut tx).await?;
        let removed = orders::fetch_orders_created_before(cutoff, &mut tx).await?;
        orders::delete_orders_created_before(cutoff, &mut tx).await?;
        tx.commit().await.map_err(SqliteOrderStoreError::from)?;
        Ok(removed)
    }
}
