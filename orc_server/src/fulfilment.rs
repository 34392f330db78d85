//! Invoice issuance for finalized orders.
//!
//! Runs from the order-finalized hook, so it only ever sees records whose payment has been committed. Issuance is
//! idempotent on the order's stored invoice reference: a redelivered event for an already-invoiced order is a
//! no-op, so duplicate callbacks can never produce a second invoice.

use ledger_tools::{InvoiceLine, LedgerApi, LedgerApiError, NewLedgerInvoice};
use log::*;
use orc_engine::{db_types::Order, ReconDatabase, ReconDatabaseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerApiError),
    #[error("Storage error: {0}")]
    DatabaseError(#[from] ReconDatabaseError),
}

#[derive(Clone)]
pub struct InvoiceIssuer<B> {
    ledger: LedgerApi,
    db: B,
}

impl<B> InvoiceIssuer<B>
where B: ReconDatabase
{
    pub fn new(ledger: LedgerApi, db: B) -> Self {
        Self { ledger, db }
    }

    /// Issue an invoice for a finalized order and record its reference against the order.
    ///
    /// Returns the invoice id actually associated with the order, whether created by this call or a previous one.
    /// A failure to record the gateway payment against the invoice is logged but does not fail issuance; the books
    /// can be reconciled from the gateway's settlement report.
    pub async fn issue(&self, order: &Order) -> Result<String, InvoiceError> {
        if let Some(invoice_id) = &order.invoice_id {
            debug!("🧾️ Order {} already has invoice [{invoice_id}]. Nothing to do.", order.order_code);
            return Ok(invoice_id.clone());
        }
        let email = order.customer_email.as_deref().filter(|e| orc_common::helpers::is_plausible_email(e));
        let contact = self.ledger.find_or_create_contact(&order.customer_name, email).await?;
        let line_items = self.invoice_lines(order);
        let invoice = NewLedgerInvoice {
            customer_id: contact.contact_id.clone(),
            reference_number: order.order_code.as_str().to_string(),
            line_items,
        };
        let invoice = self.ledger.create_invoice(invoice).await?;
        if let Some(payment_id) = &order.payment_id {
            if let Err(e) =
                self.ledger.record_payment(&contact.contact_id, &invoice.invoice_id, order.total_price, payment_id).await
            {
                warn!(
                    "🧾️ Invoice {} created for order {}, but the payment could not be recorded against it. {e}",
                    invoice.invoice_number, order.order_code
                );
            }
        }
        self.db.attach_invoice(&order.order_code, &invoice.invoice_id, &invoice.invoice_number).await?;
        info!("🧾️ Invoice {} [{}] issued for order {}", invoice.invoice_number, invoice.invoice_id, order.order_code);
        Ok(invoice.invoice_id)
    }

    fn invoice_lines(&self, order: &Order) -> Vec<InvoiceLine> {
        if order.line_items.0.is_empty() {
            // Orders captured without itemization get a single line for the full amount.
            let description = order.memo.clone().unwrap_or_else(|| format!("Order {}", order.order_code));
            return vec![InvoiceLine { description, quantity: 1, rate: order.total_price.as_major() }];
        }
        order
            .line_items
            .0
            .iter()
            .map(|line| InvoiceLine::new(line.description.clone(), line.quantity, line.unit_price))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use ledger_tools::{LedgerApi, LedgerConfig};
    use orc_common::MinorUnits;
    use orc_engine::{db_types::OrderStatus, NewPendingOrder, SqliteDatabase};
    use rand::{distributions::Alphanumeric, Rng};
    use sqlx::{migrate::MigrateDatabase, Sqlite};

    use super::*;
    use crate::endpoint_tests::{helpers::finalized_order, mocks::MockReconDb};

    fn issuer(db: MockReconDb) -> InvoiceIssuer<MockReconDb> {
        let ledger = LedgerApi::new(LedgerConfig::default()).expect("Could not build ledger client");
        InvoiceIssuer::new(ledger, db)
    }

    async fn prepare_db() -> SqliteDatabase {
        let _ = env_logger::try_init();
        let suffix = rand::thread_rng().sample_iter(&Alphanumeric).take(10).map(char::from).collect::<String>();
        let url = format!("sqlite:///tmp/orc_fulfilment_{suffix}.db");
        Sqlite::create_database(&url).await.expect("Error creating test database");
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
        sqlx::migrate!("../orc_engine/src/db/sqlite/migrations").run(db.pool()).await.expect("Error running migrations");
        db
    }

    /// The full post-payment story against a real record store: the payment commits, invoicing fails, the order
    /// must stay finalized; once an invoice is on record, every redelivery returns that same invoice.
    #[tokio::test]
    async fn finalized_state_survives_invoicing_failure_and_replays_reuse_the_invoice() {
        let db = prepare_db().await;
        let pending = NewPendingOrder::new("order_G900", "Priya Nair", MinorUnits::from_major(499.50));
        db.insert_pending_order(pending).await.expect("Could not save pending order");
        let outcome = db.finalize_order("order_G900", "pay_A900").await.expect("Finalization failed");
        assert!(outcome.is_first_finalization());
        let order = outcome.into_order();

        // the ledger has no credentials, so issuance fails after the payment has already been committed
        let ledger = LedgerApi::new(LedgerConfig::default()).expect("Could not build ledger client");
        let issuer = InvoiceIssuer::new(ledger, db.clone());
        let err = issuer.issue(&order).await.expect_err("Expected issuance to fail");
        assert!(matches!(err, InvoiceError::LedgerError(_)));
        let stored = db.fetch_order_by_gateway_id("order_G900").await.unwrap().expect("Order disappeared");
        assert_eq!(stored.status, OrderStatus::New);
        assert_eq!(stored.payment_id.as_deref(), Some("pay_A900"));
        assert!(stored.invoice_id.is_none());

        // an invoice lands on the record (a later, successful issuance); replays must return it untouched
        db.attach_invoice(&stored.order_code, "inv_900", "INV-000900").await.expect("Could not attach invoice");
        let stored = db.fetch_order_by_gateway_id("order_G900").await.unwrap().expect("Order disappeared");
        let invoice_id = issuer.issue(&stored).await.expect("Redelivery should reuse the stored invoice");
        assert_eq!(invoice_id, "inv_900");
        let invoice_id = issuer.issue(&stored).await.expect("Second redelivery should reuse the stored invoice");
        assert_eq!(invoice_id, "inv_900");
    }

    #[tokio::test]
    async fn an_already_invoiced_order_is_left_alone() {
        let mut order = finalized_order("pay_A100");
        order.invoice_id = Some("inv_42".into());
        order.invoice_number = Some("INV-000042".into());
        // no storage expectations: a redelivered event for an invoiced order must not touch anything
        let invoice_id = issuer(MockReconDb::new()).issue(&order).await.expect("Issue failed");
        assert_eq!(invoice_id, "inv_42");
    }

    #[tokio::test]
    async fn a_ledger_failure_leaves_the_order_uninvoiced() {
        let order = finalized_order("pay_A100");
        // the default ledger config has no credentials, so the first ledger call fails before any network traffic
        let err = issuer(MockReconDb::new()).issue(&order).await.expect_err("Expected error");
        assert!(matches!(err, InvoiceError::LedgerError(_)));
    }
}
