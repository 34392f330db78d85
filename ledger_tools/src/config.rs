use log::*;
use orc_common::Secret;

pub const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    /// Base url of the ledger REST API, e.g. "https://books.example.com/api/v3".
    pub base_url: String,
    /// The organisation this server writes invoices into.
    pub organization_id: String,
    pub access_token: Secret<String>,
    pub timeout_secs: u64,
}

impl LedgerConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("ORC_LEDGER_URL").unwrap_or_else(|_| {
            warn!("ORC_LEDGER_URL not set, invoice issuance will fail until it is configured");
            String::default()
        });
        let organization_id = std::env::var("ORC_LEDGER_ORG_ID").unwrap_or_default();
        let access_token = Secret::new(std::env::var("ORC_LEDGER_ACCESS_TOKEN").unwrap_or_default());
        let timeout_secs = std::env::var("ORC_LEDGER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_LEDGER_TIMEOUT_SECS);
        Self { base_url, organization_id, access_token, timeout_secs }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.access_token.reveal().is_empty()
    }
}
