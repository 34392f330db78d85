use std::fmt::Display;

use chrono::{DateTime, Utc};
use orc_common::{MinorUnits, DEFAULT_CURRENCY_CODE};
use orc_engine::{
    db_types::{OrderId, OrderKind, OrderLine, OrderStatus},
    NewPendingOrder,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Customer data captured at checkout time, before any payment exists. Everything except the name is optional;
/// a name and a phone number is often all an abandoned checkout leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadData {
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// One order line as submitted by a client, priced in major currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl From<LineItem> for OrderLine {
    fn from(item: LineItem) -> Self {
        OrderLine::new(item.description, item.quantity, MinorUnits::from_major(item.unit_price))
    }
}

impl LeadData {
    /// Build a provisional order record from this lead, tied to the given gateway order.
    pub fn into_new_order(self, gateway_order_id: &str, total_price: MinorUnits, currency: &str) -> NewPendingOrder {
        let lines = self.line_items.into_iter().map(OrderLine::from).collect::<Vec<_>>();
        NewPendingOrder {
            order_code: OrderId::random(),
            gateway_order_id: gateway_order_id.to_string(),
            kind: OrderKind::Checkout,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            memo: self.memo,
            line_items: lines,
            total_price,
            currency: currency.to_string(),
            expires_at: None,
        }
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// The charge in major currency units, e.g. 499.50.
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// The receipt reference passed to the gateway. Defaults to the generated order code.
    #[serde(default)]
    pub receipt_id: Option<String>,
    /// When present, a provisional record is saved so the checkout is recoverable if it is abandoned.
    #[serde(default)]
    pub lead: Option<LeadData>,
    /// Storefront checkouts omit this. Admin tooling sets `Invoice` when issuing an invoice-style order, which
    /// finalizes to `Paid` and may carry an expiry date.
    #[serde(default)]
    pub kind: Option<OrderKind>,
    /// Invoice-style orders only: a pending order past this instant reads back as expired.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub gateway_order_id: String,
    /// The amount as registered at the gateway, in minor units.
    pub amount: MinorUnits,
    pub currency: String,
    /// Set when a provisional record was saved. Absent when no lead data was supplied, or when the best-effort
    /// save failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_code: Option<OrderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerificationPayload {
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallbackPayload {
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
    /// The legacy/no-tracking path: supplied when no provisional record was saved at checkout time, so a
    /// finalized record can be created directly from the lead data.
    #[serde(default)]
    pub lead: Option<LeadData>,
    /// Required with `lead`: the charge in major units, used as the new record's total.
    #[serde(default)]
    pub amount: Option<f64>,
}

/// A bulk outbound mail campaign. Sends are batched and rate-limited; see the integrations module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRequest {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub success: bool,
    pub order_code: OrderId,
    pub status: OrderStatus,
}
