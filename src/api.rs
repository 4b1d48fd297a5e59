//! Request handling without an HTTP framework: maps parameters onto service
//! calls and every outcome onto the response envelope.

use crate::core::currency::ApiVersion;
use crate::core::error::GatewayError;
use crate::core::metadata::{CurrencyListingQuery, CurrencyMetadataProvider};
use crate::service::ConversionService;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

const CONVERSION_MESSAGE: &str = "currency converted successfully";
const ACCOUNT_INFO_MESSAGE: &str = "account info retrieved successfully";
const CURRENCIES_MESSAGE: &str = "currencies retrieved successfully";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionData {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub timestamp: String,
}

/// Uniform response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success { message: String, data: Value },
    Error { message: String, status: u16, data: String },
}

impl Envelope {
    pub fn success<T: Serialize>(message: &str, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Envelope::Success {
                message: message.to_string(),
                data,
            },
            Err(e) => Self::from_error(&GatewayError::BadRequest(format!(
                "Failed to serialize response: {e}"
            ))),
        }
    }

    pub fn from_error(err: &GatewayError) -> Self {
        Envelope::Error {
            message: err.message().to_string(),
            status: err.status_code(),
            data: err.detail().to_string(),
        }
    }

    /// HTTP status for this envelope.
    pub fn status(&self) -> u16 {
        match self {
            Envelope::Success { .. } => 200,
            Envelope::Error { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }
}

pub struct Gateway {
    conversions: ConversionService,
    metadata: Arc<dyn CurrencyMetadataProvider>,
}

impl Gateway {
    pub fn new(conversions: ConversionService, metadata: Arc<dyn CurrencyMetadataProvider>) -> Self {
        Self {
            conversions,
            metadata,
        }
    }

    /// `GET /{version}/conversion?from=&to=`
    pub async fn conversion(
        &self,
        version: ApiVersion,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Envelope {
        let (Some(from), Some(to)) = (from, to) else {
            let missing = if from.is_none() { "from" } else { "to" };
            return Self::failure(GatewayError::BadRequest(format!(
                "Missing query parameter: {missing}"
            )));
        };

        match self.conversions.get_conversion_rate(version, from, to).await {
            Ok(rate) => Envelope::success(
                CONVERSION_MESSAGE,
                ConversionData {
                    from: from.trim().to_uppercase(),
                    to: to.trim().to_uppercase(),
                    rate: rate.rate,
                    timestamp: rate.timestamp,
                },
            ),
            Err(e) => Self::failure(e),
        }
    }

    /// `GET /v2/account-info`
    pub async fn account_info(&self) -> Envelope {
        match self.metadata.account_info().await {
            Ok(info) => Envelope::success(ACCOUNT_INFO_MESSAGE, info),
            Err(e) => Self::failure(e),
        }
    }

    /// `GET /v2/currencies`
    pub async fn currencies(&self, query: &CurrencyListingQuery) -> Envelope {
        match self.metadata.currencies(query).await {
            Ok(listing) => Envelope::success(CURRENCIES_MESSAGE, listing),
            Err(e) => Self::failure(e),
        }
    }

    fn failure(err: GatewayError) -> Envelope {
        error!(error = %err, status = err.status_code(), "Request failed");
        Envelope::from_error(&err)
    }
}
