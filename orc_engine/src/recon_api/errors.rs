use thiserror::Error;

use crate::{db_types::OrderId, ReconDatabaseError};

#[derive(Debug, Error)]
pub enum OrderFlowError {
    /// The callback's signature did not match. Nothing was mutated. Never auto-retried with relaxed checks.
    #[error("Payment verification failed")]
    PaymentVerificationFailed,
    /// The signature secret is missing. The feature is unavailable until an operator fixes the configuration.
    #[error("Payment verification is not configured. {0}")]
    NotConfigured(String),
    /// The most severe class: the signature verified, so money has moved at the gateway, but the record store
    /// refused the state transition. Needs alerting and manual reconciliation, never silent handling.
    #[error("Payment received but the order record could not be updated. {0}")]
    RecordUpdateFailed(String),
    #[error("No order found for {0}")]
    OrderNotFound(String),
    /// A verified payment arrived for an order that was already finalized by a *different* payment. Also
    /// reconciliation territory: two charges may exist for one order.
    #[error("Order {order_code} was already finalized by payment [{existing}]; payment [{attempted}] needs manual review")]
    PaymentIdMismatch { order_code: OrderId, existing: String, attempted: String },
    #[error("Storage error: {0}")]
    DatabaseError(String),
}

impl From<ReconDatabaseError> for OrderFlowError {
    fn from(e: ReconDatabaseError) -> Self {
        match e {
            ReconDatabaseError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            ReconDatabaseError::PaymentIdMismatch { order_code, existing, attempted } => {
                OrderFlowError::PaymentIdMismatch { order_code, existing, attempted }
            },
            ReconDatabaseError::DatabaseError(e) => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}
