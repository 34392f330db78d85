use std::{sync::Arc, time::Duration};

use log::*;
use orc_common::MinorUnits;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::LedgerConfig,
    data_objects::{LedgerContact, LedgerInvoice, LedgerPayment, NewLedgerInvoice},
    LedgerApiError,
};

#[derive(Clone)]
pub struct LedgerApi {
    config: LedgerConfig,
    client: Arc<Client>,
}

impl LedgerApi {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal()))
            .map_err(|e| LedgerApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, LedgerApiError> {
        if !self.config.is_configured() {
            return Err(LedgerApiError::MissingCredentials);
        }
        let url = self.url(path);
        trace!("Sending ledger REST query: {url}");
        let mut req = self.client.request(method, url).query(&[("organization_id", self.config.organization_id.as_str())]);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| LedgerApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Ledger REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| LedgerApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| LedgerApiError::RestResponseError(e.to_string()))?;
            Err(LedgerApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Look up a contact by email address. Returns `None` if the ledger has no matching contact.
    pub async fn find_contact_by_email(&self, email: &str) -> Result<Option<LedgerContact>, LedgerApiError> {
        #[derive(Deserialize)]
        struct ContactsResponse {
            contacts: Vec<LedgerContact>,
        }
        debug!("Searching ledger contacts for {email}");
        let result =
            self.rest_query::<ContactsResponse, ()>(Method::GET, "/contacts", &[("email", email)], None).await?;
        Ok(result.contacts.into_iter().next())
    }

    pub async fn create_contact(&self, name: &str, email: Option<&str>) -> Result<LedgerContact, LedgerApiError> {
        #[derive(Deserialize)]
        struct ContactResponse {
            contact: LedgerContact,
        }
        let body = serde_json::json!({
            "contact_name": name,
            "contact_persons": email.map(|e| vec![serde_json::json!({"email": e, "is_primary_contact": true})]).unwrap_or_default(),
        });
        debug!("Creating ledger contact for {name}");
        let result = self.rest_query::<ContactResponse, _>(Method::POST, "/contacts", &[], Some(body)).await?;
        info!("Ledger contact {} created", result.contact.contact_id);
        Ok(result.contact)
    }

    /// Find a contact by the customer's email, creating one if it does not exist yet. When no email is available the
    /// lookup is skipped and a contact is created from the name alone.
    pub async fn find_or_create_contact(
        &self,
        name: &str,
        email: Option<&str>,
    ) -> Result<LedgerContact, LedgerApiError> {
        if let Some(email) = email {
            if let Some(contact) = self.find_contact_by_email(email).await? {
                debug!("Found existing ledger contact {} for {email}", contact.contact_id);
                return Ok(contact);
            }
        }
        self.create_contact(name, email).await
    }

    pub async fn create_invoice(&self, invoice: NewLedgerInvoice) -> Result<LedgerInvoice, LedgerApiError> {
        #[derive(Deserialize)]
        struct InvoiceResponse {
            invoice: LedgerInvoice,
        }
        debug!("Creating ledger invoice for order {}", invoice.reference_number);
        let result = self.rest_query::<InvoiceResponse, _>(Method::POST, "/invoices", &[], Some(invoice)).await?;
        info!("Ledger invoice {} ({}) created", result.invoice.invoice_id, result.invoice.invoice_number);
        Ok(result.invoice)
    }

    /// Record a payment against an invoice, using the gateway's payment id as the external reference so the books
    /// can be reconciled against the gateway's settlement reports.
    pub async fn record_payment(
        &self,
        contact_id: &str,
        invoice_id: &str,
        amount: MinorUnits,
        external_reference: &str,
    ) -> Result<LedgerPayment, LedgerApiError> {
        #[derive(Deserialize)]
        struct PaymentResponse {
            payment: LedgerPayment,
        }
        let body = serde_json::json!({
            "customer_id": contact_id,
            "amount": amount.as_major(),
            "reference_number": external_reference,
            "invoices": [{ "invoice_id": invoice_id, "amount_applied": amount.as_major() }],
        });
        debug!("Recording payment of {amount} against invoice {invoice_id}");
        let result = self.rest_query::<PaymentResponse, _>(Method::POST, "/customerpayments", &[], Some(body)).await?;
        info!("Payment {} recorded against invoice {invoice_id}", result.payment.payment_id);
        Ok(result.payment)
    }
}
