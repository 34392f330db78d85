use chrono::{DateTime, Utc};
use orc_common::MinorUnits;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderKind, OrderLine};

/// The data needed to create a provisional order record at checkout time, before any payment has been made.
///
/// Losing one of these is an annoyance (an abandoned checkout we cannot follow up on); failing the checkout because
/// we could not save one would be a real problem. Callers treat the save as best-effort accordingly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPendingOrder {
    /// The human-readable order code. Generated for checkout orders, supplied for invoice-style orders.
    pub order_code: OrderId,
    /// The order id assigned by the payment gateway.
    pub gateway_order_id: String,
    pub kind: OrderKind,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub memo: Option<String>,
    pub line_items: Vec<OrderLine>,
    pub total_price: MinorUnits,
    pub currency: String,
    /// Invoice-style orders only. A pending order past this instant reads back as expired.
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewPendingOrder {
    pub fn new<S: Into<String>>(gateway_order_id: S, customer_name: S, total_price: MinorUnits) -> Self {
        Self {
            order_code: OrderId::random(),
            gateway_order_id: gateway_order_id.into(),
            kind: OrderKind::Checkout,
            customer_name: customer_name.into(),
            customer_email: None,
            customer_phone: None,
            memo: None,
            line_items: Vec::new(),
            total_price,
            currency: orc_common::DEFAULT_CURRENCY_CODE.to_string(),
            expires_at: None,
        }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_lines(mut self, lines: Vec<OrderLine>) -> Self {
        self.line_items = lines;
        self
    }
}

/// The result of a finalization attempt at the storage layer.
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    /// The conditional update landed: this call transitioned the record. Fan-out should run.
    Finalized(Order),
    /// The record was already finalized with the same payment id. The stored record is returned unchanged and no
    /// side effects should run.
    AlreadyFinalized(Order),
}

impl FinalizeOutcome {
    pub fn order(&self) -> &Order {
        match self {
            FinalizeOutcome::Finalized(o) | FinalizeOutcome::AlreadyFinalized(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            FinalizeOutcome::Finalized(o) | FinalizeOutcome::AlreadyFinalized(o) => o,
        }
    }

    pub fn is_first_finalization(&self) -> bool {
        matches!(self, FinalizeOutcome::Finalized(_))
    }
}
