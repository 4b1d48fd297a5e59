pub mod api;
pub mod core;
pub mod providers;
pub mod service;
pub mod setup;
pub mod store;

// Shorthand for `fxgate::config`
pub use crate::core::config;

use crate::api::{Envelope, Gateway};
use crate::core::config::AppConfig;
use crate::core::currency::ApiVersion;
use crate::core::metadata::CurrencyListingQuery;
use crate::providers::{OpenExchangeProvider, XeProvider};
use crate::service::ConversionService;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        version: ApiVersion,
        from: String,
        to: String,
    },
    AccountInfo,
    Currencies(CurrencyListingQuery),
}

/// Wires the cache store and both providers from a loaded configuration.
pub fn build_gateway(config: &AppConfig) -> Result<Gateway> {
    let store = store::open_store(config)?;
    let v1 = Arc::new(OpenExchangeProvider::new(&config.providers.open_exchange)?);
    let v2 = Arc::new(XeProvider::new(&config.providers.xe)?);

    let conversions = ConversionService::new(store, v1, v2.clone());
    Ok(Gateway::new(conversions, v2))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<Envelope> {
    info!("fxgate starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!(cache = ?config.cache, "Loaded config");

    let gateway = build_gateway(&config)?;

    let envelope = match command {
        AppCommand::Convert { version, from, to } => {
            gateway
                .conversion(version, Some(&from), Some(&to))
                .await
        }
        AppCommand::AccountInfo => gateway.account_info().await,
        AppCommand::Currencies(query) => gateway.currencies(&query).await,
    };
    Ok(envelope)
}
