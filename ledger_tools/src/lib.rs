//! REST client for the external invoicing ledger.
//!
//! The ledger is the system of record for invoices and contacts. This crate wraps the three calls the
//! reconciliation flow needs: find-or-create a contact, create an invoice, and record a payment against it.
//! Each call can fail independently; the caller decides what a partial result means.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::LedgerApi;
pub use config::LedgerConfig;
pub use data_objects::{InvoiceLine, LedgerContact, LedgerInvoice, LedgerPayment, NewLedgerInvoice};
pub use error::LedgerApiError;
