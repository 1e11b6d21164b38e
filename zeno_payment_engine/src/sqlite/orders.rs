use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{FromRow, SqliteConnection};
use zpg_common::Shillings;

use super::SqliteOrderStoreError;
use crate::db_types::{Order, OrderId, OrderStatusType};

#[derive(Debug, FromRow)]
struct OrderRow {
    order_id: String,
    status: String,
    buyer_email: String,
    buyer_name: String,
    buyer_phone: String,
    amount: i64,
    transaction_id: Option<String>,
    provider_response: Option<String>,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = SqliteOrderStoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let provider_response = row
            .provider_response
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| SqliteOrderStoreError::CorruptRecord(format!("{}: {e}", row.order_id)))?;
        Ok(Order {
            order_id: OrderId(row.order_id),
            status: OrderStatusType::from(row.status),
            buyer_email: row.buyer_email,
            buyer_name: row.buyer_name,
            buyer_phone: row.buyer_phone,
            amount: Shillings::from(row.amount),
            transaction_id: row.transaction_id,
            provider_response,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn serialize_response(order: &Order) -> Option<String> {
    order.provider_response.as_ref().map(|v| v.to_string())
}

/// Makes the enclosing transaction take the database write lock immediately. A deferred transaction that reads first
/// and writes later fails with `SQLITE_BUSY` when another writer got in between; holding the lock from the start makes
/// concurrent transactions wait for each other instead.
pub async fn take_write_lock(conn: &mut SqliteConnection) -> Result<(), SqliteOrderStoreError> {
    sqlx::query("UPDATE orders SET order_id = order_id WHERE 0").execute(conn).await?;
    Ok(())
}

pub async fn insert_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), SqliteOrderStoreError> {
    sqlx::query(
        r#"
            INSERT INTO orders (
                order_id,
                status,
                buyer_email,
                buyer_name,
                buyer_phone,
                amount,
                transaction_id,
                provider_response,
                idempotency_key,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11);
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.status.to_string())
    .bind(&order.buyer_email)
    .bind(&order.buyer_name)
    .bind(&order.buyer_phone)
    .bind(order.amount.value())
    .bind(&order.transaction_id)
    .bind(serialize_response(order))
    .bind(&order.idempotency_key)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;
    trace!("🗃️ Inserted order {}", order.order_id);
    Ok(())
}

/// Writes the mutable fields of `order` back to the database.
pub async fn update_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), SqliteOrderStoreError> {
    sqlx::query(
        r#"
            UPDATE orders SET
                status = $1,
                transaction_id = $2,
                provider_response = $3,
                updated_at = $4
            WHERE order_id = $5;
        "#,
    )
    .bind(order.status.to_string())
    .bind(&order.transaction_id)
    .bind(serialize_response(order))
    .bind(order.updated_at)
    .bind(order.order_id.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

/// Sets the order's idempotency key to NULL. Returns the number of rows touched (0 or 1).
pub async fn clear_idempotency_key(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<u64, SqliteOrderStoreError> {
    let result = sqlx::query("UPDATE orders SET idempotency_key = NULL WHERE order_id = $1")
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteOrderStoreError> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    row.map(Order::try_from).transpose()
}

/// Returns the most recent order with the given idempotency key created after `since`.
pub async fn fetch_order_by_idempotency_key(
    key: &str,
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteOrderStoreError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
            SELECT * FROM orders
            WHERE idempotency_key = $1 AND created_at > $2
            ORDER BY created_at DESC
            LIMIT 1;
        "#,
    )
    .bind(key)
    .bind(since)
    .fetch_optional(conn)
    .await?;
    row.map(Order::try_from).transpose()
}

pub async fn fetch_orders_created_before(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteOrderStoreError> {
    let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE created_at < $1 ORDER BY created_at")
        .bind(cutoff)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(Order::try_from).collect()
}

pub async fn delete_orders_created_before(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteOrderStoreError> {
    let result = sqlx::query("DELETE FROM orders WHERE created_at < $1").bind(cutoff).execute(conn).await?;
    Ok(result.rows_affected())
}
