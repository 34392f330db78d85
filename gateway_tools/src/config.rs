use log::*;
use orc_common::Secret;

pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Base url of the gateway REST API, e.g. "https://api.paygate.example".
    pub base_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// Per-request timeout in seconds. A timed-out call is a transient failure; retries are the caller's decision.
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("ORC_GATEWAY_URL").unwrap_or_else(|_| {
            warn!("ORC_GATEWAY_URL not set, using the gateway's public endpoint as default");
            "https://api.razorpay.com/v1".to_string()
        });
        let key_id = std::env::var("ORC_GATEWAY_KEY_ID").unwrap_or_default();
        let key_secret = Secret::new(std::env::var("ORC_GATEWAY_KEY_SECRET").unwrap_or_default());
        if key_id.is_empty() {
            warn!("ORC_GATEWAY_KEY_ID is not set. Order creation will fail until credentials are configured.");
        }
        let timeout_secs = std::env::var("ORC_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS);
        Self { base_url, key_id, key_secret, timeout_secs }
    }

    pub fn has_credentials(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.reveal().is_empty()
    }
}
