//! The primary API for the order reconciliation flow.
//!
//! [`OrderFlowApi`] sits between the HTTP layer and the storage backend. It owns the signature verifier and the
//! event producers, and it enforces the ordering rule that matters most here: a callback's signature is checked
//! before anything is written, and fan-out events fire only after the finalization has been committed, and only
//! for the call that actually performed the transition.

use log::*;

use crate::{
    db::traits::{FinalizeOutcome, NewPendingOrder, ReconDatabase, ReconDatabaseError},
    db_types::{Order, OrderId},
    events::{EventProducers, OrderFinalizedEvent},
    helpers::{PaymentSignatureError, SignatureVerifier},
    recon_api::{
        errors::OrderFlowError,
        order_objects::{FinalizeRequest, FinalizeSource, OrderResult},
    },
};

pub struct OrderFlowApi<B> {
    db: B,
    verifier: SignatureVerifier,
    producers: EventProducers,
}

impl<B: std::fmt::Debug> std::fmt::Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B>
where B: ReconDatabase
{
    pub fn new(db: B, verifier: SignatureVerifier, producers: EventProducers) -> Self {
        Self { db, verifier, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Save a provisional order record at checkout time. Idempotent on the gateway order id; returns the record
    /// and whether this call created it.
    pub async fn save_pending_order(&self, order: NewPendingOrder) -> Result<(Order, bool), OrderFlowError> {
        let (order, created) = self.db.insert_pending_order(order).await?;
        if created {
            info!("🔄️ Saved provisional order {} for gateway order [{}]", order.order_code, order.gateway_order_id);
        } else {
            debug!(
                "🔄️ Provisional order for gateway order [{}] already existed as {}",
                order.gateway_order_id, order.order_code
            );
        }
        Ok((order, created))
    }

    /// Verify a payment callback's signature without mutating anything. Used by the pre-flight verification
    /// endpoint; the result is identical to the check [`OrderFlowApi::finalize_order`] performs.
    pub fn verify_payment(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), OrderFlowError> {
        self.verifier.verify(gateway_order_id, payment_id, signature).map_err(|e| match e {
            PaymentSignatureError::NoSecretConfigured => OrderFlowError::NotConfigured(e.to_string()),
            PaymentSignatureError::SignatureMismatch { .. } => OrderFlowError::PaymentVerificationFailed,
        })
    }

    /// Handle a payment-completion callback end to end.
    ///
    /// The signature is verified first; a failure here means nothing has been written and the callback is simply
    /// rejected. After verification the record is transitioned by a conditional update, so a duplicate delivery
    /// resolves to [`FinalizeOutcome::AlreadyFinalized`] rather than a second transition. The order-finalized
    /// event is published only when this call performed the transition, and only after it has been committed.
    ///
    /// A storage failure *after* verification is reported as [`OrderFlowError::RecordUpdateFailed`]: the payment
    /// is real, the record is not updated, and a human needs to know.
    pub async fn finalize_order(&self, req: FinalizeRequest) -> Result<FinalizeOutcome, OrderFlowError> {
        let FinalizeRequest { gateway_order_id, payment_id, signature, source } = req;
        self.verify_payment(&gateway_order_id, &payment_id, &signature)?;
        let result = match source {
            FinalizeSource::ExistingRecord => self.db.finalize_order(&gateway_order_id, &payment_id).await,
            FinalizeSource::NewRecord(order) => self.db.insert_finalized_order(order, &payment_id).await,
        };
        let outcome = result.map_err(|e| match e {
            ReconDatabaseError::DatabaseError(e) => {
                error!(
                    "🔄️🚨️ Payment [{payment_id}] for gateway order [{gateway_order_id}] verified, but the order \
                     record could not be updated: {e}. Manual reconciliation is required."
                );
                OrderFlowError::RecordUpdateFailed(e.to_string())
            },
            other => OrderFlowError::from(other),
        })?;
        match &outcome {
            FinalizeOutcome::Finalized(order) => {
                info!(
                    "🔄️ Order {} finalized as {} by payment [{payment_id}]",
                    order.order_code, order.status
                );
                self.publish_order_finalized(order.clone()).await;
            },
            FinalizeOutcome::AlreadyFinalized(order) => {
                info!(
                    "🔄️ Duplicate callback for order {}: already finalized by payment [{payment_id}]. No-op.",
                    order.order_code
                );
            },
        }
        Ok(outcome)
    }

    /// Fetch an order by order code or gateway order id, reporting the status it should currently be read as.
    pub async fn fetch_order(&self, id: &str) -> Result<Option<OrderResult>, OrderFlowError> {
        let order = self.db.fetch_order_by_any_id(id).await?;
        Ok(order.map(OrderResult::read_now))
    }

    /// Record the invoice issued for a finalized order.
    pub async fn attach_invoice(
        &self,
        code: &OrderId,
        invoice_id: &str,
        invoice_number: &str,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.attach_invoice(code, invoice_id, invoice_number).await?;
        info!("🔄️ Invoice {invoice_number} [{invoice_id}] recorded against order {code}");
        Ok(order)
    }

    async fn publish_order_finalized(&self, order: Order) {
        for producer in &self.producers.order_finalized_producer {
            trace!("📬️ Publishing OrderFinalized event for {}", order.order_code);
            producer.publish_event(OrderFinalizedEvent { order: order.clone() }).await;
        }
    }
}
