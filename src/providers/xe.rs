use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::USER_AGENT;
use crate::core::config::XeConfig;
use crate::core::currency::{ConversionRate, CurrencyCode, CurrencyRateProvider, utc_timestamp};
use crate::core::error::{GatewayError, Result};
use crate::core::metadata::{CurrencyListingQuery, CurrencyMetadataProvider};

#[derive(Debug, Deserialize)]
struct XeConvertResponse {
    to: Option<Vec<XeQuote>>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XeQuote {
    quotecurrency: String,
    mid: f64,
}

/// V2 rate provider and metadata source backed by the XE currency data API.
///
/// Every call authenticates with basic auth and goes through the same status
/// mapping before the body is looked at.
pub struct XeProvider {
    base_url: String,
    api_id: String,
    api_key: String,
    client: Client,
}

/// Maps a non-200 upstream status to its error kind, in priority order.
fn status_error(status: StatusCode, body: &str, not_found: impl FnOnce() -> String) -> GatewayError {
    match status.as_u16() {
        401 => GatewayError::Unauthorized("Invalid XE API credentials.".to_string()),
        400 => GatewayError::BadRequest("Bad request to XE API.".to_string()),
        404 => GatewayError::NotFound(not_found()),
        429 => GatewayError::OperationForbidden("Rate limit exceeded with XE API.".to_string()),
        code if code >= 500 => {
            GatewayError::ServiceUnavailable("XE API is currently unavailable.".to_string())
        }
        _ => GatewayError::BadRequest(format!("Unexpected error: {body}")),
    }
}

impl XeProvider {
    pub fn new(config: &XeConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_id: config.api_id.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let url = format!("{}/{}", self.base_url, path);
        let parsed = if params.is_empty() {
            Url::parse(&url)
        } else {
            Url::parse_with_params(&url, params)
        };
        parsed.map_err(|e| GatewayError::BadRequest(format!("Invalid provider URL: {e}")))
    }

    /// Issues one authenticated GET and returns the body of a 200 response.
    async fn fetch(&self, url: Url, not_found: impl FnOnce() -> String) -> Result<String> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_id, Some(&self.api_key))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "XE request failed");
                GatewayError::ServiceUnavailable("Could not connect to XE API.".to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read XE response");
            GatewayError::ServiceUnavailable("Could not connect to XE API.".to_string())
        })?;
        debug!(%status, response = %body, "Received XE response");

        if status != StatusCode::OK {
            error!(%status, "XE upstream returned an error status");
            return Err(status_error(status, &body, not_found));
        }
        Ok(body)
    }

    fn parse_json(body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| {
            error!(error = ?e, response = %body, "Failed to parse XE response");
            GatewayError::BadRequest(format!("Failed to parse JSON response: {e}"))
        })
    }
}

#[async_trait]
impl CurrencyRateProvider for XeProvider {
    #[instrument(name = "XeRate", skip(self), fields(from = %from, to = %to))]
    async fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<ConversionRate> {
        let url = self.endpoint(
            "convert_from.json",
            &[
                ("from", from.to_string()),
                ("to", to.to_string()),
                ("amount", "1".to_string()),
            ],
        )?;
        debug!("Requesting V2 conversion rate");

        let body = self
            .fetch(url, || format!("Currency {from} to {to} not found."))
            .await?;

        let data: XeConvertResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, response = %body, "Failed to parse XE conversion response");
            GatewayError::BadRequest(format!("Failed to parse JSON response: {e}"))
        })?;

        let quotes = data.to.ok_or_else(|| {
            GatewayError::BadRequest("XE response is missing the `to` array".to_string())
        })?;
        let quote = quotes
            .into_iter()
            .find(|quote| quote.quotecurrency == to.as_str())
            .ok_or_else(|| {
                GatewayError::NotFound(format!("No conversion rate found for {from} to {to}."))
            })?;

        Ok(ConversionRate {
            rate: quote.mid,
            timestamp: data.timestamp.unwrap_or_else(utc_timestamp),
        })
    }
}

#[async_trait]
impl CurrencyMetadataProvider for XeProvider {
    #[instrument(name = "XeAccountInfo", skip(self))]
    async fn account_info(&self) -> Result<Value> {
        let url = self.endpoint("account_info/", &[])?;
        let body = self
            .fetch(url, || "Account info not found.".to_string())
            .await?;
        Self::parse_json(&body)
    }

    #[instrument(name = "XeCurrencies", skip(self))]
    async fn currencies(&self, query: &CurrencyListingQuery) -> Result<Value> {
        let url = self.endpoint("currencies", &query.to_params())?;
        let body = self
            .fetch(url, || "Currency listing not found.".to_string())
            .await?;
        Self::parse_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(base_url: &str) -> XeProvider {
        XeProvider::new(&XeConfig {
            base_url: base_url.to_string(),
            api_id: "xe-id".to_string(),
            api_key: "xe-key".to_string(),
        })
        .unwrap()
    }

    async fn create_mock_server(request_path: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    async fn convert(mock_server: &MockServer, from: &str, to: &str) -> Result<ConversionRate> {
        let provider = provider_for(&mock_server.uri());
        provider
            .get_rate(
                &CurrencyCode::parse(from).unwrap(),
                &CurrencyCode::parse(to).unwrap(),
            )
            .await
    }

    #[tokio::test]
    async fn test_successful_rate_fetch_uses_upstream_timestamp() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "from": "USD",
            "amount": 1.0,
            "timestamp": "2024-01-01T00:00:00Z",
            "to": [{"quotecurrency": "EUR", "mid": 0.91}]
        }"#;
        Mock::given(method("GET"))
            .and(path("/convert_from.json"))
            .and(query_param("from", "USD"))
            .and(query_param("to", "EUR"))
            .and(query_param("amount", "1"))
            .and(basic_auth("xe-id", "xe-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = convert(&mock_server, "USD", "EUR").await.unwrap();
        assert_eq!(
            result,
            ConversionRate {
                rate: 0.91,
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_timestamp_is_generated() {
        let body = r#"{"to": [{"quotecurrency": "GBP", "mid": 0.5}, {"quotecurrency": "EUR", "mid": 0.91}]}"#;
        let mock_server = create_mock_server("/convert_from.json", 200, body).await;

        let result = convert(&mock_server, "USD", "EUR").await.unwrap();
        assert_eq!(result.rate, 0.91);
        assert!(result.timestamp.ends_with('Z'), "{}", result.timestamp);
    }

    #[tokio::test]
    async fn test_quote_absent_is_not_found() {
        let body = r#"{"to": [{"quotecurrency": "GBP", "mid": 0.79}]}"#;
        let mock_server = create_mock_server("/convert_from.json", 200, body).await;

        let err = convert(&mock_server, "USD", "EUR").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::NotFound("No conversion rate found for USD to EUR.".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_to_array_is_bad_request() {
        let mock_server = create_mock_server("/convert_from.json", 200, r#"{"from": "USD"}"#).await;

        let err = convert(&mock_server, "USD", "EUR").await.unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases: [(u16, fn(&GatewayError) -> bool); 7] = [
            (401, |e| matches!(e, GatewayError::Unauthorized(_))),
            (400, |e| matches!(e, GatewayError::BadRequest(_))),
            (404, |e| matches!(e, GatewayError::NotFound(_))),
            (429, |e| matches!(e, GatewayError::OperationForbidden(_))),
            (500, |e| matches!(e, GatewayError::ServiceUnavailable(_))),
            (503, |e| matches!(e, GatewayError::ServiceUnavailable(_))),
            (418, |e| matches!(e, GatewayError::BadRequest(_))),
        ];

        for (status, expected) in cases {
            let mock_server = create_mock_server("/convert_from.json", status, "teapot").await;
            let err = convert(&mock_server, "USD", "EUR").await.unwrap_err();
            assert!(expected(&err), "status {status} gave {err:?}");
        }
    }

    #[tokio::test]
    async fn test_unexpected_status_carries_body() {
        let mock_server = create_mock_server("/convert_from.json", 418, "teapot").await;
        let err = convert(&mock_server, "USD", "EUR").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::BadRequest("Unexpected error: teapot".to_string())
        );
    }

    #[tokio::test]
    async fn test_status_checked_before_body() {
        // A 404 with a valid quote payload is still a 404
        let body = r#"{"to": [{"quotecurrency": "EUR", "mid": 0.91}]}"#;
        let mock_server = create_mock_server("/convert_from.json", 404, body).await;

        let err = convert(&mock_server, "USD", "EUR").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::NotFound("Currency USD to EUR not found.".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_service_unavailable() {
        let provider = provider_for("http://127.0.0.1:1");
        let err = provider
            .get_rate(
                &CurrencyCode::parse("USD").unwrap(),
                &CurrencyCode::parse("EUR").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServiceUnavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_account_info_passthrough() {
        let body = r#"{"id": "abc", "organization": "Acme", "package": "LIVE"}"#;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account_info/"))
            .and(basic_auth("xe-id", "xe-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server.uri());
        let info = provider.account_info().await.unwrap();
        assert_eq!(info["organization"], "Acme");
        assert_eq!(info["package"], "LIVE");
    }

    #[tokio::test]
    async fn test_account_info_unauthorized() {
        let mock_server = create_mock_server("/account_info/", 401, "{}").await;
        let provider = provider_for(&mock_server.uri());

        let err = provider.account_info().await.unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_currencies_forwards_filters() {
        let body = r#"{"terms": "http://www.xe.com/legal/", "currencies": [{"iso": "EUR"}]}"#;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currencies"))
            .and(query_param("iso", "EUR"))
            .and(query_param("obsolete", "true"))
            .and(query_param("language", "de"))
            .and(query_param("crypto", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server.uri());
        let query = CurrencyListingQuery {
            iso: Some("EUR".to_string()),
            obsolete: true,
            language: "de".to_string(),
            ..Default::default()
        };
        let listing = provider.currencies(&query).await.unwrap();
        assert_eq!(listing["currencies"][0]["iso"], "EUR");
    }

    #[tokio::test]
    async fn test_currencies_server_error() {
        let mock_server = create_mock_server("/currencies", 502, "bad gateway").await;
        let provider = provider_for(&mock_server.uri());

        let err = provider
            .currencies(&CurrencyListingQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServiceUnavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_currencies_malformed_body() {
        let mock_server = create_mock_server("/currencies", 200, "not json").await;
        let provider = provider_for(&mock_server.uri());

        let err = provider
            .currencies(&CurrencyListingQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)), "{err:?}");
    }
}
