use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::traits::{NewPendingOrder, ReconDatabaseError},
    db_types::{Order, OrderId, OrderStatus},
};

/// Insert a new order row with the given status and (optional) payment id. Conflict-safe: when a record for the
/// gateway order id already exists the insert is a no-op and `None` is returned. The insert is the first write of
/// the transaction, so two concurrent deliveries never deadlock on a read-to-write lock upgrade; the loser simply
/// waits and then observes the conflict.
async fn insert_order(
    order: NewPendingOrder,
    status: OrderStatus,
    payment_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, ReconDatabaseError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_code,
                gateway_order_id,
                kind,
                customer_name,
                customer_email,
                customer_phone,
                memo,
                line_items,
                total_price,
                currency,
                status,
                payment_id,
                expires_at,
                submitted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                CASE WHEN $12 IS NULL THEN NULL ELSE CURRENT_TIMESTAMP END)
            ON CONFLICT (gateway_order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_code)
    .bind(order.gateway_order_id)
    .bind(order.kind.to_string())
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(order.customer_phone)
    .bind(order.memo)
    .bind(Json(order.line_items))
    .bind(order.total_price.value())
    .bind(order.currency)
    .bind(status.to_string())
    .bind(payment_id)
    .bind(order.expires_at)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Inserts the order, returning `false` in the second parameter if a record for the gateway order id already
/// exists. Like [`try_finalize`], idempotence rests on the conditional write itself, not on a prior read.
pub async fn idempotent_insert(
    order: NewPendingOrder,
    status: OrderStatus,
    payment_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), ReconDatabaseError> {
    let gateway_order_id = order.gateway_order_id.clone();
    match insert_order(order, status, payment_id, conn).await? {
        Some(order) => {
            debug!("🗃️ Order {} inserted with id {}", order.order_code, order.id);
            Ok((order, true))
        },
        // the insert lost to an existing record for this gateway order; hand that record back
        None => {
            let order = fetch_order_by_gateway_id(&gateway_order_id, conn)
                .await?
                .ok_or(ReconDatabaseError::OrderNotFound(gateway_order_id))?;
            Ok((order, false))
        },
    }
}

pub async fn fetch_order_by_code(code: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_code = $1").bind(code.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_gateway_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Resolve either identifier to the underlying record. If a code and a gateway id ever collide on different rows,
/// the code match wins.
pub async fn fetch_order_by_any_id(id: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "SELECT * FROM orders WHERE order_code = $1 OR gateway_order_id = $1 ORDER BY (order_code = $1) DESC LIMIT 1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// The conditional finalization update. The `payment_id IS NULL` guard is what makes concurrent duplicate callback
/// deliveries safe: only one of them can observe the unset marker.
pub async fn try_finalize(
    gateway_order_id: &str,
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = CASE kind WHEN 'Invoice' THEN 'Paid' ELSE 'New' END,
                payment_id = $2,
                submitted_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE gateway_order_id = $1 AND payment_id IS NULL
            RETURNING *;
        "#,
    )
    .bind(gateway_order_id)
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn attach_invoice(
    code: &OrderId,
    invoice_id: &str,
    invoice_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET invoice_id = $2, invoice_number = $3, updated_at = CURRENT_TIMESTAMP WHERE order_code = \
         $1 RETURNING *",
    )
    .bind(code.as_str())
    .bind(invoice_id)
    .bind(invoice_number)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
