//! Best-effort outbound integrations.
//!
//! Everything in this module is fire-and-forget from the reconciliation flow's point of view: a failed email or a
//! CRM outage is logged per channel and never surfaces to the finalization result.
mod bulk;
mod crm;
mod mailer;
mod notifier;

use thiserror::Error;

pub use bulk::{run_in_batches, DEFAULT_BATCH_SIZE};
pub use crm::CrmApi;
pub use mailer::MailerApi;
pub use notifier::Notifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Could not initialize client. {0}")]
    Initialization(String),
    #[error("The integration is not configured. {0}")]
    NotConfigured(String),
    #[error("Error sending request: {0}")]
    TransportError(String),
    #[error("Provider returned an error. Code {status}: {message}")]
    ProviderError { status: u16, message: String },
}
