use std::{sync::Arc, time::Duration};

use log::*;
use orc_common::MinorUnits;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::GatewayConfig, data_objects::NewGatewayOrder, GatewayApiError, GatewayOrder};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        if !self.config.has_credentials() {
            return Err(GatewayApiError::MissingCredentials);
        }
        let url = self.url(path);
        trace!("Sending gateway REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Gateway REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            // Surface the gateway's own error text so the caller can log and act on it
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Create a new order at the payment gateway.
    ///
    /// `amount_major` is the agreed charge in major currency units (e.g. 499.50 INR). The conversion into the
    /// gateway's minor unit happens here, and only here.
    pub async fn create_order(
        &self,
        amount_major: f64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayApiError> {
        let amount = MinorUnits::from_major(amount_major);
        let payload =
            NewGatewayOrder { amount: amount.value(), currency: currency.to_string(), receipt: receipt.to_string() };
        debug!("Creating gateway order for {amount} {currency} (receipt {receipt})");
        let order = self.rest_query::<GatewayOrder, NewGatewayOrder>(Method::POST, "/orders", Some(payload)).await?;
        info!("Gateway order {} created for {} {}", order.id, order.amount, order.currency);
        Ok(order)
    }
}
