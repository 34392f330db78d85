use orc_common::MinorUnits;
use serde::{Deserialize, Serialize};

/// A contact in the invoicing ledger. Contacts are keyed by email where possible, falling back to name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerContact {
    pub contact_id: String,
    pub contact_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// One line on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i64,
    /// Unit price in major units, which is how the ledger expresses money.
    pub rate: f64,
}

/// Payload for creating a new invoice.
#[derive(Debug, Clone, Serialize)]
pub struct NewLedgerInvoice {
    pub customer_id: String,
    /// The internal order code, so an invoice can always be traced back to its order.
    pub reference_number: String,
    pub line_items: Vec<InvoiceLine>,
}

/// An invoice as returned by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerInvoice {
    pub invoice_id: String,
    pub invoice_number: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A payment recorded against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerPayment {
    pub payment_id: String,
    #[serde(default)]
    pub reference_number: Option<String>,
}

impl InvoiceLine {
    pub fn new<S: Into<String>>(description: S, quantity: i64, unit_price: MinorUnits) -> Self {
        Self { description: description.into(), quantity, rate: unit_price.as_major() }
    }
}
