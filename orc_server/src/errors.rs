use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use orc_engine::OrderFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    // The exact error text matters: clients never learn whether a signature was wrong, only that verification
    // failed. Expected vs received digests live in the server log.
    #[error("Payment verification failed")]
    PaymentVerificationFailed,
    /// A verified payment could not be written to the order record. Money has moved; the record has not. These
    /// responses need operator attention, and the distinct error text is what the alerting matches on.
    #[error("Payment received but the order could not be updated. {0}")]
    RecordUpdateFailed(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Order creation failed. {0}")]
    OrderCreationFailed(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::PaymentVerificationFailed => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RecordUpdateFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderCreationFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::PaymentVerificationFailed => Self::PaymentVerificationFailed,
            OrderFlowError::NotConfigured(m) => Self::ConfigurationError(m),
            OrderFlowError::RecordUpdateFailed(m) => Self::RecordUpdateFailed(m),
            OrderFlowError::OrderNotFound(id) => Self::NoRecordFound(id),
            // the client learns nothing about the conflicting payment ids; operators read them from the log
            OrderFlowError::PaymentIdMismatch { order_code, .. } => {
                Self::RecordUpdateFailed(format!("Order {order_code} is already tied to a different payment"))
            },
            OrderFlowError::DatabaseError(m) => Self::BackendError(m),
        }
    }
}
