use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url, header::ACCEPT};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, instrument};

use super::USER_AGENT;
use crate::core::config::OpenExchangeConfig;
use crate::core::currency::{ConversionRate, CurrencyCode, CurrencyRateProvider};
use crate::core::error::{GatewayError, Result};

#[derive(Debug, Deserialize)]
struct OpenExchangeResponse {
    rates: Option<HashMap<String, f64>>,
}

/// V1 rate provider backed by an Open Exchange Rates style `latest` endpoint.
///
/// The configured base URL is the full endpoint; the app id goes into the
/// query string. Upstream does not timestamp rates, so results are stamped
/// when the response arrives.
pub struct OpenExchangeProvider {
    base_url: String,
    app_id: String,
    client: Client,
}

impl OpenExchangeProvider {
    pub fn new(config: &OpenExchangeConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: config.base_url.clone(),
            app_id: config.app_id.clone(),
            client,
        })
    }

    fn request_url(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Url> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("app_id", self.app_id.as_str()),
                ("base", from.as_str()),
                ("symbols", to.as_str()),
                ("prettyprint", "false"),
                ("show_alternative", "false"),
            ],
        )
        .map_err(|e| GatewayError::BadRequest(format!("Invalid provider URL: {e}")))
    }
}

#[async_trait]
impl CurrencyRateProvider for OpenExchangeProvider {
    #[instrument(name = "OpenExchangeRate", skip(self), fields(from = %from, to = %to))]
    async fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<ConversionRate> {
        let url = self.request_url(from, to)?;
        debug!("Requesting V1 conversion rate");

        // Error text must not echo the URL, it carries the app id
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!(error = %e, "V1 request failed");
                GatewayError::BadRequest(format!("Invalid currency code: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "V1 upstream returned an HTTP error");
            return Err(GatewayError::OperationForbidden(format!(
                "Invalid currency code: HTTP error {status}"
            )));
        }

        let text = response.text().await.map_err(|e| {
            GatewayError::BadRequest(format!("Failed to read response: {}", e.without_url()))
        })?;
        debug!(response = %text, "Received V1 response");

        let data: OpenExchangeResponse = serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse V1 response");
            GatewayError::BadRequest(format!("Failed to parse JSON response: {e}"))
        })?;

        let rate = data
            .rates
            .and_then(|rates| rates.get(to.as_str()).copied())
            .ok_or_else(|| GatewayError::NotFound(format!("{from} || {to}")))?;

        Ok(ConversionRate::fetched_now(rate))
    }
}
