use std::{sync::Arc, time::Duration};

use log::*;
use orc_engine::db_types::Order;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::json;

use crate::{config::CrmConfig, integrations::NotifyError};

const CRM_TIMEOUT_SECS: u64 = 10;

/// REST client for the CRM's lead API.
#[derive(Clone)]
pub struct CrmApi {
    config: CrmConfig,
    client: Arc<Client>,
}

impl CrmApi {
    pub fn new(config: CrmConfig) -> Result<Self, NotifyError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| NotifyError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(CRM_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotifyError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Push a finalized order into the CRM as a (won) lead. The CRM upserts on email/phone, so redelivered events
    /// update the existing lead rather than creating a duplicate.
    pub async fn push_lead(&self, order: &Order) -> Result<(), NotifyError> {
        if !self.config.is_configured() {
            return Err(NotifyError::NotConfigured("CRM url or api key is missing".to_string()));
        }
        let url = format!("{}/leads/upsert", self.config.api_url.trim_end_matches('/'));
        let payload = json!({
            "name": order.customer_name,
            "email": order.customer_email,
            "phone": order.customer_phone,
            "source": "order-reconciliation",
            "reference": order.order_code.as_str(),
            "amount": order.total_price.as_major(),
            "currency": order.currency,
            "note": order.memo,
        });
        trace!("🤝️ Upserting CRM lead for order {}", order.order_code);
        let response =
            self.client.post(url).json(&payload).send().await.map_err(|e| NotifyError::TransportError(e.to_string()))?;
        if response.status().is_success() {
            debug!("🤝️ CRM lead upserted for order {}", order.order_code);
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| NotifyError::TransportError(e.to_string()))?;
            Err(NotifyError::ProviderError { status, message })
        }
    }
}
