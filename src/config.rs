use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Service identifier of the recipe dataset on the food safety open API
pub const SERVICE_ID: &str = "COOKRCP01";

/// Runtime configuration for the recipe browser
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrowserConfig {
    /// Base URL of the open API, without the key or service segments
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key placed in the request path
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Number of recipes fetched per batch
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Highest row number the API serves
    #[serde(default = "default_max_row")]
    pub max_row: u32,
    /// Minimum time the loading indicator stays visible, in milliseconds
    #[serde(default = "default_min_loading_ms")]
    pub min_loading_ms: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            page_size: default_page_size(),
            max_row: default_max_row(),
            min_loading_ms: default_min_loading_ms(),
            timeout: default_timeout(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://openapi.foodsafetykorea.go.kr/api".to_string()
}

fn default_api_key() -> String {
    "sample".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_max_row() -> u32 {
    1968
}

fn default_min_loading_ms() -> u64 {
    3000
}

fn default_timeout() -> u64 {
    30
}

impl BrowserConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_BROWSER__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_BROWSER__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn min_loading(&self) -> Duration {
        Duration::from_millis(self.min_loading_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Full request URL for the inclusive row range `start..=end`
    pub fn endpoint(&self, start: u32, end: u32) -> String {
        format!(
            "{}/{}/{}/json/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_key,
            SERVICE_ID,
            start,
            end
        )
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<BrowserConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("RECIPE_BROWSER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = BrowserConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.max_row, 1968);
        assert_eq!(config.min_loading(), Duration::from_millis(3000));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.api_key, "sample");
    }

    #[test]
    fn test_endpoint_layout() {
        let config = BrowserConfig {
            base_url: "http://localhost:1234/api/".to_string(),
            api_key: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint(11, 20),
            "http://localhost:1234/api/abc/COOKRCP01/json/11/20"
        );
    }

    #[test]
    fn test_empty_sources_fall_back_to_defaults() {
        let settings = Config::builder().build().unwrap();
        let config: BrowserConfig = settings.try_deserialize().unwrap();
        assert_eq!(config, BrowserConfig::default());
    }
}
