use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invoicing ledger credentials are not configured")]
    MissingCredentials,
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Ledger call failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}
