use std::{sync::Arc, time::Duration};

use log::*;
use orc_engine::db_types::Order;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::json;

use crate::{config::MailConfig, integrations::NotifyError};

const MAIL_TIMEOUT_SECS: u64 = 10;

/// REST client for the transactional mail provider.
#[derive(Clone)]
pub struct MailerApi {
    config: MailConfig,
    client: Arc<Client>,
}

impl MailerApi {
    pub fn new(config: MailConfig) -> Result<Self, NotifyError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| NotifyError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(MAIL_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotifyError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        if !self.config.is_configured() {
            return Err(NotifyError::NotConfigured("Mail provider url or api key is missing".to_string()));
        }
        let url = format!("{}/send", self.config.api_url.trim_end_matches('/'));
        let payload = json!({
            "from": self.config.sender,
            "to": [to],
            "subject": subject,
            "text": body,
        });
        trace!("📧️ Sending mail to {to}: {subject}");
        let response =
            self.client.post(url).json(&payload).send().await.map_err(|e| NotifyError::TransportError(e.to_string()))?;
        if response.status().is_success() {
            debug!("📧️ Mail sent to {to}");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| NotifyError::TransportError(e.to_string()))?;
            Err(NotifyError::ProviderError { status, message })
        }
    }

    /// The internal sales alert. Sent for every finalized order, regardless of customer contact details.
    pub async fn send_sales_alert(&self, order: &Order) -> Result<(), NotifyError> {
        let subject = format!("New paid order {}", order.order_code);
        let body = format!(
            "Order {} has been paid.\n\nCustomer: {}\nAmount: {} {}\nPayment: {}\n",
            order.order_code,
            order.customer_name,
            order.total_price,
            order.currency,
            order.payment_id.as_deref().unwrap_or("-"),
        );
        self.send_email(&self.config.sales_alert_recipient, &subject, &body).await
    }

    /// The customer receipt. Callers are responsible for only passing orders with a plausible email address.
    pub async fn send_customer_receipt(&self, order: &Order, email: &str) -> Result<(), NotifyError> {
        let subject = format!("Payment received for order {}", order.order_code);
        let body = format!(
            "Hi {},\n\nWe have received your payment of {} {} for order {}. Your invoice will follow shortly.\n\n\
             Thank you!\n",
            order.customer_name, order.total_price, order.currency, order.order_code,
        );
        self.send_email(email, &subject, &body).await
    }

    /// Bulk campaign send. Batched and rate-limited so the provider does not flag the traffic; see
    /// [`crate::integrations::run_in_batches`] for the pacing rules. Returns the number of successful sends.
    pub async fn send_campaign(&self, recipients: Vec<String>, subject: &str, body: &str) -> usize {
        let total = recipients.len();
        info!("📧️ Starting campaign send to {total} recipients");
        let sent = super::run_in_batches(recipients, super::DEFAULT_BATCH_SIZE, |to| {
            let mailer = self.clone();
            let subject = subject.to_string();
            let body = body.to_string();
            async move {
                mailer.send_email(&to, &subject, &body).await.map_err(|e| {
                    warn!("📧️ Campaign send to {to} failed. {e}");
                    e
                })
            }
        })
        .await;
        info!("📧️ Campaign complete. {sent}/{total} mails sent");
        sent
    }
}
