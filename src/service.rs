//! Cache-backed conversion lookups

use crate::core::cache::{CONVERSION_TTL, CacheStore, conversion_key, decode_entry, encode_entry};
use crate::core::currency::{ApiVersion, ConversionRate, CurrencyCode, CurrencyRateProvider};
use crate::core::error::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Serves conversion rates from the cache store, falling back to the
/// provider for the requested API version on a miss.
///
/// Holds no state of its own between calls. Two concurrent misses on the same
/// key both reach the provider and the later write wins.
#[derive(Clone)]
pub struct ConversionService {
    store: Arc<dyn CacheStore>,
    v1: Arc<dyn CurrencyRateProvider>,
    v2: Arc<dyn CurrencyRateProvider>,
}

impl ConversionService {
    pub fn new(
        store: Arc<dyn CacheStore>,
        v1: Arc<dyn CurrencyRateProvider>,
        v2: Arc<dyn CurrencyRateProvider>,
    ) -> Self {
        Self { store, v1, v2 }
    }

    fn provider(&self, version: ApiVersion) -> &dyn CurrencyRateProvider {
        match version {
            ApiVersion::V1 => self.v1.as_ref(),
            ApiVersion::V2 => self.v2.as_ref(),
        }
    }

    /// Validates both codes, then answers from cache or from one upstream call.
    ///
    /// Provider errors are returned unchanged and nothing is cached for them.
    /// A cached value that cannot be decoded is treated as a miss and
    /// overwritten by the fresh rate.
    #[instrument(name = "ConversionRate", skip(self), fields(version = %version))]
    pub async fn get_conversion_rate(
        &self,
        version: ApiVersion,
        from: &str,
        to: &str,
    ) -> Result<ConversionRate> {
        let from = CurrencyCode::parse(from)?;
        let to = CurrencyCode::parse(to)?;
        let key = conversion_key(version, &from, &to);

        if let Some(cached) = self.store.get(&key).await {
            match decode_entry(&cached) {
                Some(rate) => {
                    info!("[{version}] {from}/{to} is already cached.");
                    return Ok(rate);
                }
                None => warn!(%key, value = %cached, "Ignoring malformed cache entry"),
            }
        }

        debug!("[{version}] fetching {from}/{to} from upstream");
        let rate = self.provider(version).get_rate(&from, &to).await?;
        self.store
            .set(&key, &encode_entry(&rate), CONVERSION_TTL)
            .await;
        Ok(rate)
    }
}
