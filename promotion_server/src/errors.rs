use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::{error, warn};
use payos_tools::PayosApiError;
use promotion_engine::{CatalogError, ErrorKind, PromotionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Seller identity is required. {0}")]
    Unauthenticated(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The payment gateway returned an error. {0}")]
    GatewayError(String),
    #[error("The payment gateway did not respond in time.")]
    GatewayTimeout,
    #[error("The payment gateway is unavailable. Try again later. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PromotionError> for ServerError {
    fn from(e: PromotionError) -> Self {
        let msg = e.to_string();
        match e.kind() {
            ErrorKind::Validation => Self::ValidationError(msg),
            ErrorKind::Forbidden => Self::InsufficientPermissions(msg),
            ErrorKind::Conflict => Self::Conflict(msg),
            ErrorKind::NotFound => Self::NoRecordFound(msg),
            ErrorKind::Backend => {
                error!("💻️ Backend error: {msg}");
                Self::BackendError(msg)
            },
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        PromotionError::from(e).into()
    }
}

impl From<PayosApiError> for ServerError {
    fn from(e: PayosApiError) -> Self {
        match e {
            PayosApiError::Timeout => Self::GatewayTimeout,
            PayosApiError::MissingCredentials | PayosApiError::Initialization(_) => {
                error!("💳️ The PayOS client is not usable. {e}");
                Self::ConfigurationError(e.to_string())
            },
            e if e.is_validation_error() => Self::ValidationError(e.to_string()),
            e if e.is_retriable() => {
                warn!("💳️ Transient PayOS failure. {e}");
                Self::GatewayUnavailable(e.to_string())
            },
            e => Self::GatewayError(e.to_string()),
        }
    }
}
