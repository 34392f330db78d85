use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    db::traits::NewPendingOrder,
    db_types::{Order, OrderStatus},
};

/// Where the record being finalized comes from. The two paths are statically distinguishable; there is no runtime
/// sniffing of "string id or object".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FinalizeSource {
    /// The normal path: a provisional record was saved at checkout time and is patched in place.
    ExistingRecord,
    /// The legacy/no-tracking path: no provisional record exists, so a finalized record is created from the
    /// supplied lead data directly.
    NewRecord(NewPendingOrder),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub source: FinalizeSource,
}

/// An order as reported to callers: the raw record plus the status it should currently be read as. A pending
/// invoice order past its expiry date reports `Expired` here while the stored record stays untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub status: OrderStatus,
    pub order: Order,
}

impl OrderResult {
    pub fn read_now(order: Order) -> Self {
        let status = order.effective_status(Utc::now());
        Self { status, order }
    }
}
