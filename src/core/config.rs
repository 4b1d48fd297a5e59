use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf};
use tracing::debug;

pub const OPEN_XR_APP_ID_VAR: &str = "OPEN_XR_APP_ID";
pub const OPEN_XR_BASE_URL_VAR: &str = "OPEN_XR_BASE_URL";
pub const XECD_API_ID_VAR: &str = "XECD_API_ID";
pub const XECD_API_KEY_VAR: &str = "XECD_API_KEY";
pub const XECD_BASE_URL_VAR: &str = "XECD_BASE_URL";

const REDACTED: &str = "<redacted>";

/// V1 upstream: app id travels in the query string.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct OpenExchangeConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub app_id: String,
}

impl fmt::Debug for OpenExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenExchangeConfig")
            .field("base_url", &self.base_url)
            .field("app_id", &REDACTED)
            .finish()
    }
}

/// V2 upstream: basic auth with api id and key.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct XeConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_id: String,
    #[serde(default)]
    pub api_key: String,
}

impl fmt::Debug for XeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XeConfig")
            .field("base_url", &self.base_url)
            .field("api_id", &self.api_id)
            .field("api_key", &REDACTED)
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub open_exchange: OpenExchangeConfig,
    #[serde(default)]
    pub xe: XeConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    #[default]
    Disk,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    pub data_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Loads the file at the default location, applies environment overrides
    /// and validates the result.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxgate", "fxgate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.cache.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "fxgate", "fxgate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        debug!(providers = ?config.providers, "Successfully loaded config");
        Ok(config)
    }

    /// Overlays provider settings found through `lookup`; non-empty values win
    /// over the file.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = [
            (OPEN_XR_APP_ID_VAR, &mut self.providers.open_exchange.app_id),
            (OPEN_XR_BASE_URL_VAR, &mut self.providers.open_exchange.base_url),
            (XECD_API_ID_VAR, &mut self.providers.xe.api_id),
            (XECD_API_KEY_VAR, &mut self.providers.xe.api_key),
            (XECD_BASE_URL_VAR, &mut self.providers.xe.base_url),
        ];
        for (name, field) in overrides {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                debug!("Config override from {}", name);
                *field = value;
            }
        }
    }

    /// Fails naming every missing provider setting.
    pub fn validate(&self) -> Result<()> {
        let oxr = &self.providers.open_exchange;
        let xe = &self.providers.xe;
        let required = [
            ("providers.open_exchange.base_url", OPEN_XR_BASE_URL_VAR, &oxr.base_url),
            ("providers.open_exchange.app_id", OPEN_XR_APP_ID_VAR, &oxr.app_id),
            ("providers.xe.base_url", XECD_BASE_URL_VAR, &xe.base_url),
            ("providers.xe.api_id", XECD_API_ID_VAR, &xe.api_id),
            ("providers.xe.api_key", XECD_API_KEY_VAR, &xe.api_key),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, _, value)| value.trim().is_empty())
            .map(|(key, var, _)| format!("{key} ({var})"))
            .collect();

        if !missing.is_empty() {
            bail!("Missing required configuration: {}", missing.join(", "));
        }
        Ok(())
    }
}
