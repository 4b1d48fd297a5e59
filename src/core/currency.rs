//! Currency conversion abstractions

use crate::core::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Three letter currency code, upper-cased.
///
/// Only the length is checked; `"1$X"` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(code: &str) -> Result<Self> {
        let normalized = code.trim().to_uppercase();
        if normalized.chars().count() != 3 {
            return Err(GatewayError::InvalidCurrencyCode(format!(
                "Invalid currency code: {code}"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Upstream API generation. Each version is served by its own provider and
/// owns a separate cache key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ApiVersion::V1 => "v1",
                ApiVersion::V2 => "v2",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRate {
    pub rate: f64,
    /// ISO-8601 UTC, either from upstream or stamped at fetch time
    pub timestamp: String,
}

impl ConversionRate {
    /// Rate stamped with the current UTC time.
    pub fn fetched_now(rate: f64) -> Self {
        Self {
            rate,
            timestamp: utc_timestamp(),
        }
    }
}

/// Current UTC time as ISO-8601 with a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Performs exactly one upstream call for the pair.
    async fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<ConversionRate>;
}
