use std::env;

use gateway_tools::GatewayConfig;
use ledger_tools::LedgerConfig;
use log::*;
use orc_common::{helpers::parse_boolean_flag, Secret};

const DEFAULT_ORC_HOST: &str = "127.0.0.1";
const DEFAULT_ORC_PORT: u16 = 8360;
/// Events queued for the fan-out handler before publishers start waiting.
const DEFAULT_EVENT_BUFFER_SIZE: usize = 50;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How payment-completion callbacks are authenticated.
    pub payment: PaymentVerificationConfig,
    /// Payment gateway REST credentials.
    pub gateway: GatewayConfig,
    /// Invoicing ledger REST credentials.
    pub ledger: LedgerConfig,
    /// Transactional mail provider credentials.
    pub mail: MailConfig,
    /// CRM lead-sync credentials.
    pub crm: CrmConfig,
    pub event_buffer_size: usize,
}

#[derive(Clone, Debug, Default)]
pub struct PaymentVerificationConfig {
    /// The shared secret the gateway signs callbacks with. Verification is unavailable until this is set.
    pub hmac_secret: Option<Secret<String>>,
    /// If true, payment ids with the test prefix skip signature verification. **DANGER**: sandbox use only.
    pub allow_test_payments: bool,
    /// Overrides the default test-payment prefix.
    pub test_payment_prefix: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MailConfig {
    /// Base url of the mail provider's REST API.
    pub api_url: String,
    pub api_key: Secret<String>,
    /// The From address on outgoing mail.
    pub sender: String,
    /// Where internal sales alerts go.
    pub sales_alert_recipient: String,
}

#[derive(Clone, Debug, Default)]
pub struct CrmConfig {
    /// Base url of the CRM's REST API.
    pub api_url: String,
    pub api_key: Secret<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ORC_HOST.to_string(),
            port: DEFAULT_ORC_PORT,
            database_url: String::default(),
            payment: PaymentVerificationConfig::default(),
            gateway: GatewayConfig::default(),
            ledger: LedgerConfig::default(),
            mail: MailConfig::default(),
            crm: CrmConfig::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ORC_HOST").ok().unwrap_or_else(|| DEFAULT_ORC_HOST.into());
        let port = env::var("ORC_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for ORC_PORT. {e} Using the default, {DEFAULT_ORC_PORT}, instead."
                    );
                    DEFAULT_ORC_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_ORC_PORT);
        let database_url = env::var("ORC_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ ORC_DATABASE_URL is not set. Please set it to the URL for the order database.");
            String::default()
        });
        let event_buffer_size = env::var("ORC_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        Self {
            host,
            port,
            database_url,
            payment: PaymentVerificationConfig::from_env_or_default(),
            gateway: GatewayConfig::new_from_env_or_default(),
            ledger: LedgerConfig::new_from_env_or_default(),
            mail: MailConfig::from_env_or_default(),
            crm: CrmConfig::from_env_or_default(),
            event_buffer_size,
        }
    }
}

impl PaymentVerificationConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_secret = match env::var("ORC_PAYMENT_HMAC_SECRET") {
            Ok(s) if !s.is_empty() => Some(Secret::new(s)),
            _ => {
                error!(
                    "🪛️ ORC_PAYMENT_HMAC_SECRET is not set. Payment callbacks cannot be verified and finalization \
                     will be rejected until it is configured."
                );
                None
            },
        };
        let allow_test_payments = parse_boolean_flag(env::var("ORC_ALLOW_TEST_PAYMENTS").ok(), false);
        let test_payment_prefix = env::var("ORC_TEST_PAYMENT_PREFIX").ok().filter(|s| !s.is_empty());
        Self { hmac_secret, allow_test_payments, test_payment_prefix }
    }
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("ORC_MAIL_API_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ ORC_MAIL_API_URL is not set. Confirmation emails will not be sent.");
            String::default()
        });
        let api_key = Secret::new(env::var("ORC_MAIL_API_KEY").unwrap_or_default());
        let sender = env::var("ORC_MAIL_SENDER").ok().unwrap_or_else(|| "orders@localhost".to_string());
        let sales_alert_recipient =
            env::var("ORC_MAIL_SALES_ALERT").ok().unwrap_or_else(|| "sales@localhost".to_string());
        Self { api_url, api_key, sender, sales_alert_recipient }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.reveal().is_empty()
    }
}

impl CrmConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("ORC_CRM_API_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ ORC_CRM_API_URL is not set. Finalized orders will not be synced to the CRM.");
            String::default()
        });
        let api_key = Secret::new(env::var("ORC_CRM_API_KEY").unwrap_or_default());
        Self { api_url, api_key }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.reveal().is_empty()
    }
}
