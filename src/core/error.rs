//! Error kinds shared by the rate providers, the conversion service and the API layer

use thiserror::Error;

/// Failure of a conversion or metadata lookup.
///
/// Every upstream or transport failure is reclassified into one of these
/// kinds at the provider boundary. The detail string is what ends up in the
/// `data` field of an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Currency code did not normalize to three characters
    #[error("{0}")]
    InvalidCurrencyCode(String),

    /// Malformed upstream response or an unclassified provider failure
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Upstream rejected our credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Currency pair or listing absent upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream rate limit or forbidden operation
    #[error("Operation forbidden: {0}")]
    OperationForbidden(String),

    /// Upstream unreachable or failing
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// HTTP status the API layer answers with for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::InvalidCurrencyCode(_) => 422,
            GatewayError::BadRequest(_) => 400,
            GatewayError::Unauthorized(_) => 401,
            GatewayError::NotFound(_) => 404,
            GatewayError::OperationForbidden(_) => 403,
            GatewayError::ServiceUnavailable(_) => 503,
        }
    }

    /// Client facing headline used as the envelope `message`.
    pub fn message(&self) -> &'static str {
        match self {
            GatewayError::InvalidCurrencyCode(_) => "Invalid currency code provided.",
            GatewayError::BadRequest(_) => "Bad request.",
            GatewayError::Unauthorized(_) => "Unauthorized access to the rate provider.",
            GatewayError::NotFound(_) => "Requested resource not found.",
            GatewayError::OperationForbidden(_) => "Operation forbidden by the rate provider.",
            GatewayError::ServiceUnavailable(_) => "Rate provider is currently unavailable.",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            GatewayError::InvalidCurrencyCode(d)
            | GatewayError::BadRequest(d)
            | GatewayError::Unauthorized(d)
            | GatewayError::NotFound(d)
            | GatewayError::OperationForbidden(d)
            | GatewayError::ServiceUnavailable(d) => d,
        }
    }
}
