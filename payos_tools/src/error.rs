use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PayosApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("PayOS credentials are not configured. Check the LPG_PAYOS_* environment variables.")]
    MissingCredentials,
    #[error("Payment amount must be greater than 0, but was {0}")]
    InvalidAmount(i64),
    #[error("Payment description cannot be empty")]
    EmptyDescription,
    #[error("Callback data does not contain an order code")]
    MissingOrderCode,
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("REST query failed with status {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("The payment gateway rejected the request. Code {code}. {desc}")]
    GatewayRejected { code: String, desc: String },
}

impl PayosApiError {
    /// True if the same request could reasonably succeed when tried again later.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout | Self::RestResponseError(_)) ||
            matches!(self, Self::QueryError { status, .. } if *status >= 500)
    }

    /// True if the request was rejected before anything was sent to the gateway.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::InvalidAmount(_) | Self::EmptyDescription | Self::MissingOrderCode)
    }
}

impl From<reqwest::Error> for PayosApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestResponseError(e.to_string())
        }
    }
}
