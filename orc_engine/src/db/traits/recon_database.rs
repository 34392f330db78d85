use thiserror::Error;

use super::{FinalizeOutcome, NewPendingOrder};
use crate::db_types::{Order, OrderId};

#[derive(Debug, Error)]
pub enum ReconDatabaseError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("No order found for {0}")]
    OrderNotFound(String),
    #[error("Order {order_code} is already finalized with payment [{existing}]; refusing payment [{attempted}]")]
    PaymentIdMismatch { order_code: OrderId, existing: String, attempted: String },
}

/// The storage contract for the reconciliation engine.
///
/// Correctness of the whole system rests on two properties of implementations:
/// * [`ReconDatabase::finalize_order`] must be a conditional update that only fires while `payment_id` is unset,
///   so two concurrent callback deliveries can never both transition the same record.
/// * Records are never deleted, and expiry is derived by readers, never written.
#[allow(async_fn_in_trait)]
pub trait ReconDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Persist a provisional (payment-pending) order record. Idempotent on `gateway_order_id`: if a record for the
    /// gateway order already exists it is returned with the second element set to `false`.
    async fn insert_pending_order(&self, order: NewPendingOrder) -> Result<(Order, bool), ReconDatabaseError>;

    /// Fetch an order by its human-readable order code.
    async fn fetch_order_by_code(&self, code: &OrderId) -> Result<Option<Order>, ReconDatabaseError>;

    /// Fetch an order by the gateway-assigned order id.
    async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<Order>, ReconDatabaseError>;

    /// Fetch an order by either identifier. Customer-facing links carry the order code; gateway callbacks carry the
    /// gateway order id; both must resolve to the same underlying record.
    async fn fetch_order_by_any_id(&self, id: &str) -> Result<Option<Order>, ReconDatabaseError>;

    /// Transition the order for `gateway_order_id` into its finalized status and attach the payment id, in a single
    /// conditional update that only applies while `payment_id` is still unset.
    ///
    /// * update applied → `Finalized`, with `submitted_at` stamped.
    /// * no update, stored payment id equals `payment_id` → `AlreadyFinalized` (the idempotent retry path).
    /// * no update, stored payment id differs → [`ReconDatabaseError::PaymentIdMismatch`].
    /// * no such order → [`ReconDatabaseError::OrderNotFound`].
    async fn finalize_order(&self, gateway_order_id: &str, payment_id: &str)
        -> Result<FinalizeOutcome, ReconDatabaseError>;

    /// Create a brand-new record that is born finalized. This is the legacy path for payments that arrive with no
    /// prior provisional record. Idempotent on `gateway_order_id`, with the same mismatch semantics as
    /// [`ReconDatabase::finalize_order`].
    async fn insert_finalized_order(
        &self,
        order: NewPendingOrder,
        payment_id: &str,
    ) -> Result<FinalizeOutcome, ReconDatabaseError>;

    /// Record the invoice issued for a finalized order. Only ever called after finalization has been committed.
    async fn attach_invoice(
        &self,
        code: &OrderId,
        invoice_id: &str,
        invoice_number: &str,
    ) -> Result<Order, ReconDatabaseError>;
}
