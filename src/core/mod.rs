//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod metadata;

// Re-export main types for cleaner imports
pub use cache::CacheStore;
pub use currency::{ApiVersion, ConversionRate, CurrencyCode, CurrencyRateProvider};
pub use error::GatewayError;
pub use metadata::{CurrencyListingQuery, CurrencyMetadataProvider};
