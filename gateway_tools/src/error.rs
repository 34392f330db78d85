use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Payment gateway credentials are not configured")]
    MissingCredentials,
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Gateway call failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl GatewayApiError {
    /// Configuration errors are fatal until an operator intervenes; everything else is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayApiError::MissingCredentials | GatewayApiError::Initialization(_) => false,
            GatewayApiError::QueryError { status, .. } => *status >= 500,
            GatewayApiError::RestResponseError(_) => true,
            GatewayApiError::JsonError(_) => false,
        }
    }
}
