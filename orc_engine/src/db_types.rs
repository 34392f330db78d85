use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use orc_common::MinorUnits;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
/// The human-readable order code. This is the identifier customers see in invoice links; it is distinct from the
/// gateway-assigned order id that correlates payment callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate a fresh order code for checkout orders. Administrative invoice-style orders supply their own.
    pub fn random() -> Self {
        let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect();
        Self(format!("ORC-{}", suffix.to_ascii_uppercase()))
    }
}

//--------------------------------------     OrderStatus       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// A provisional record. The gateway order exists but no verified payment has arrived yet.
    PaymentPending,
    /// A finalized checkout order: paid for, not yet fulfilled.
    New,
    /// A finalized invoice-style order.
    Paid,
    /// A pending invoice-style order past its expiry date. Derived at read time, never stored.
    Expired,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::PaymentPending => write!(f, "PaymentPending"),
            OrderStatus::New => write!(f, "New"),
            OrderStatus::Paid => write!(f, "Paid"),
            OrderStatus::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PaymentPending" => Ok(Self::PaymentPending),
            "New" => Ok(Self::New),
            "Paid" => Ok(Self::Paid),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to PaymentPending");
            OrderStatus::PaymentPending
        })
    }
}

//--------------------------------------      OrderKind        -------------------------------------------------------
/// Checkout orders come in via the storefront and finalize to `New`. Invoice orders are issued manually by an
/// admin, may carry an expiry date, and finalize to `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderKind {
    Checkout,
    Invoice,
}

impl OrderKind {
    /// The terminal status this kind of order reaches on finalization.
    pub fn finalized_status(&self) -> OrderStatus {
        match self {
            OrderKind::Checkout => OrderStatus::New,
            OrderKind::Invoice => OrderStatus::Paid,
        }
    }
}

impl Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Checkout => write!(f, "Checkout"),
            OrderKind::Invoice => write!(f, "Invoice"),
        }
    }
}

impl From<String> for OrderKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Checkout" => Self::Checkout,
            "Invoice" => Self::Invoice,
            _ => {
                error!("Invalid order kind: {value}. Defaulting to Checkout");
                Self::Checkout
            },
        }
    }
}

//--------------------------------------      OrderLine        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
}

impl OrderLine {
    pub fn new<S: Into<String>>(description: S, quantity: i64, unit_price: MinorUnits) -> Self {
        Self { description: description.into(), quantity, unit_price }
    }

    pub fn line_total(&self) -> MinorUnits {
        self.unit_price * self.quantity
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_code: OrderId,
    /// The id assigned by the payment gateway at order-creation time. Unique; correlates callbacks to this record.
    pub gateway_order_id: String,
    pub kind: OrderKind,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub memo: Option<String>,
    pub line_items: Json<Vec<OrderLine>>,
    pub total_price: MinorUnits,
    pub currency: String,
    pub status: OrderStatus,
    /// The gateway-assigned id of the successful charge. Set at most once; its presence is the idempotency marker.
    pub payment_id: Option<String>,
    pub invoice_id: Option<String>,
    pub invoice_number: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_finalized(&self) -> bool {
        self.payment_id.is_some()
    }

    /// The status this order should be reported as at time `now`. A pending order past its expiry date reads back
    /// as `Expired` without anything being written to the backing store.
    pub fn effective_status(&self, now: DateTime<Utc>) -> OrderStatus {
        match (self.status, self.expires_at) {
            (OrderStatus::PaymentPending, Some(expiry)) if now > expiry => OrderStatus::Expired,
            (status, _) => status,
        }
    }
}
