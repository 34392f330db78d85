use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{new_pool, orders};
use crate::{
    db::traits::{FinalizeOutcome, NewPendingOrder, ReconDatabase, ReconDatabaseError},
    db_types::{Order, OrderId, OrderStatus},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new(max_connections: u32) -> Result<Self, ReconDatabaseError> {
        let url = super::db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, ReconDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl ReconDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_pending_order(&self, order: NewPendingOrder) -> Result<(Order, bool), ReconDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let (order, inserted) =
            orders::idempotent_insert(order, OrderStatus::PaymentPending, None, &mut tx).await?;
        tx.commit().await?;
        if inserted {
            debug!("🗃️ Pending order {} saved for gateway order [{}]", order.order_code, order.gateway_order_id);
        } else {
            debug!("🗃️ Gateway order [{}] already has record {}", order.gateway_order_id, order.order_code);
        }
        Ok((order, inserted))
    }

    async fn fetch_order_by_code(&self, code: &OrderId) -> Result<Option<Order>, ReconDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_code(code, &mut conn).await?)
    }

    async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<Order>, ReconDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_gateway_id(gateway_order_id, &mut conn).await?)
    }

    async fn fetch_order_by_any_id(&self, id: &str) -> Result<Option<Order>, ReconDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_any_id(id, &mut conn).await?)
    }

    async fn finalize_order(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
    ) -> Result<FinalizeOutcome, ReconDatabaseError> {
        let mut tx = self.pool.begin().await?;
        if let Some(order) = orders::try_finalize(gateway_order_id, payment_id, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Order {} finalized as {} with payment [{payment_id}]", order.order_code, order.status);
            return Ok(FinalizeOutcome::Finalized(order));
        }
        // The guard didn't fire: either the record doesn't exist, or it is already finalized.
        let existing = orders::fetch_order_by_gateway_id(gateway_order_id, &mut tx).await?;
        tx.commit().await?;
        match existing {
            None => Err(ReconDatabaseError::OrderNotFound(gateway_order_id.to_string())),
            Some(order) => match order.payment_id.as_deref() {
                Some(existing_payment) if existing_payment == payment_id => {
                    debug!("🗃️ Order {} already finalized with payment [{payment_id}]. No-op.", order.order_code);
                    Ok(FinalizeOutcome::AlreadyFinalized(order))
                },
                Some(existing_payment) => Err(ReconDatabaseError::PaymentIdMismatch {
                    order_code: order.order_code.clone(),
                    existing: existing_payment.to_string(),
                    attempted: payment_id.to_string(),
                }),
                // The conditional update only skips rows with a payment id set, so this cannot happen outside of a
                // concurrent delete, which the schema forbids.
                None => Err(ReconDatabaseError::OrderNotFound(gateway_order_id.to_string())),
            },
        }
    }

    async fn insert_finalized_order(
        &self,
        order: NewPendingOrder,
        payment_id: &str,
    ) -> Result<FinalizeOutcome, ReconDatabaseError> {
        let status = order.kind.finalized_status();
        let mut tx = self.pool.begin().await?;
        let (order, inserted) = orders::idempotent_insert(order, status, Some(payment_id), &mut tx).await?;
        tx.commit().await?;
        if inserted {
            debug!("🗃️ Order {} created directly in {} with payment [{payment_id}]", order.order_code, order.status);
            return Ok(FinalizeOutcome::Finalized(order));
        }
        match order.payment_id.as_deref() {
            Some(existing_payment) if existing_payment == payment_id => Ok(FinalizeOutcome::AlreadyFinalized(order)),
            Some(existing_payment) => Err(ReconDatabaseError::PaymentIdMismatch {
                order_code: order.order_code.clone(),
                existing: existing_payment.to_string(),
                attempted: payment_id.to_string(),
            }),
            // A pending record already existed for this gateway order; finalize it instead.
            None => self.finalize_order(&order.gateway_order_id, payment_id).await,
        }
    }

    async fn attach_invoice(
        &self,
        code: &OrderId,
        invoice_id: &str,
        invoice_number: &str,
    ) -> Result<Order, ReconDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::attach_invoice(code, invoice_id, invoice_number, &mut conn)
            .await?
            .ok_or_else(|| ReconDatabaseError::OrderNotFound(code.as_str().to_string()))?;
        debug!("🗃️ Invoice {invoice_number} recorded against order {}", order.order_code);
        Ok(order)
    }
}
