use orc_common::MinorUnits;
use serde::{Deserialize, Serialize};

/// The order-creation payload, as the gateway expects it. `amount` is already in minor units.
#[derive(Debug, Clone, Serialize)]
pub struct NewGatewayOrder {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// An order as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: MinorUnits,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
