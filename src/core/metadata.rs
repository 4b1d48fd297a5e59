use crate::core::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Filters for the upstream currency listing, forwarded as query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyListingQuery {
    pub iso: Option<String>,
    pub obsolete: bool,
    pub language: String,
    pub additional_info: Option<String>,
    pub crypto: bool,
}

impl Default for CurrencyListingQuery {
    fn default() -> Self {
        Self {
            iso: None,
            obsolete: false,
            language: "en".to_string(),
            additional_info: None,
            crypto: false,
        }
    }
}

impl CurrencyListingQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("obsolete", self.obsolete.to_string()),
            ("language", self.language.clone()),
            ("crypto", self.crypto.to_string()),
        ];
        if let Some(iso) = &self.iso {
            params.push(("iso", iso.clone()));
        }
        if let Some(info) = &self.additional_info {
            params.push(("additionalInfo", info.clone()));
        }
        params
    }
}

/// Uncached pass-through account and currency metadata.
#[async_trait]
pub trait CurrencyMetadataProvider: Send + Sync {
    async fn account_info(&self) -> Result<Value>;
    async fn currencies(&self, query: &CurrencyListingQuery) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = CurrencyListingQuery::default().to_params();
        assert_eq!(
            params,
            vec![
                ("obsolete", "false".to_string()),
                ("language", "en".to_string()),
                ("crypto", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_optional_params_included_when_set() {
        let query = CurrencyListingQuery {
            iso: Some("USD,EUR".to_string()),
            obsolete: true,
            language: "fr".to_string(),
            additional_info: Some("symbol".to_string()),
            crypto: true,
        };
        let params = query.to_params();
        assert!(params.contains(&("iso", "USD,EUR".to_string())));
        assert!(params.contains(&("additionalInfo", "symbol".to_string())));
        assert!(params.contains(&("obsolete", "true".to_string())));
        assert!(params.contains(&("crypto", "true".to_string())));
        assert!(params.contains(&("language", "fr".to_string())));
    }
}
