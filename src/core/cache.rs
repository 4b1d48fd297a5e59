//! Key/value cache contract and the conversion entry format stored in it

use crate::core::currency::{ApiVersion, ConversionRate, CurrencyCode};
use async_trait::async_trait;
use std::time::Duration;

/// Lifetime of a cached conversion rate.
pub const CONVERSION_TTL: Duration = Duration::from_secs(3600);

const ENTRY_SEPARATOR: char = '|';

/// String store with per-key expiry.
///
/// Implementations must be safe for concurrent use; per-key writes are last
/// write wins. Absence and expiry are both reported as `None`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str, ttl: Duration);
}

/// `"{version}_{from}_{to}"`, e.g. `v1_USD_EUR`.
pub fn conversion_key(version: ApiVersion, from: &CurrencyCode, to: &CurrencyCode) -> String {
    format!("{version}_{from}_{to}")
}

/// Serializes as `"<rate>|<timestamp>"`.
pub fn encode_entry(rate: &ConversionRate) -> String {
    format!("{}{ENTRY_SEPARATOR}{}", rate.rate, rate.timestamp)
}

/// Inverse of [`encode_entry`]. Returns `None` for a value without a
/// separator or with a non-numeric rate.
pub fn decode_entry(value: &str) -> Option<ConversionRate> {
    let (rate, timestamp) = value.split_once(ENTRY_SEPARATOR)?;
    let rate = rate.parse::<f64>().ok()?;
    Some(ConversionRate {
        rate,
        timestamp: timestamp.to_string(),
    })
}
