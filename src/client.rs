use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::config::BrowserConfig;
use crate::error::FetchError;
use crate::model::{RecipeBatch, RecipeRecord};

/// Result code the API uses for success
pub const RESULT_OK: &str = "INFO-000";
/// Result code the API uses when the requested rows do not exist
pub const RESULT_NO_DATA: &str = "INFO-200";

/// Source of recipe batches
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Fetch `count` rows starting at the 1-based row `start`
    async fn fetch_batch(&self, start: u32, count: u32) -> Result<RecipeBatch, FetchError>;
}

/// HTTP client for the food safety recipe API
pub struct RecipeClient {
    client: Client,
    config: BrowserConfig,
}

impl RecipeClient {
    /// Create a client from configuration
    pub fn new(config: &BrowserConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("recipe-browser/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: impl Into<String>, config: &BrowserConfig) -> Result<Self, FetchError> {
        let config = BrowserConfig {
            base_url: base_url.into(),
            ..config.clone()
        };
        Self::new(&config)
    }

    fn check_window(&self, start: u32, count: u32) -> Result<u32, FetchError> {
        let invalid = || FetchError::InvalidWindow {
            start,
            count,
            max_row: self.config.max_row,
        };
        if start == 0 || count == 0 {
            return Err(invalid());
        }
        let end = start.checked_add(count - 1).ok_or_else(invalid)?;
        if end > self.config.max_row {
            return Err(invalid());
        }
        Ok(end)
    }
}

#[async_trait]
impl RecipeSource for RecipeClient {
    async fn fetch_batch(&self, start: u32, count: u32) -> Result<RecipeBatch, FetchError> {
        let end = self.check_window(start, count)?;
        let url = self.config.endpoint(start, end);
        debug!("Fetching recipes {}..={} from {}", start, end, url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Recipe API answered HTTP {}", status);
            return Err(FetchError::Network(format!("HTTP status {}", status)));
        }

        let envelope: Envelope = response.json().await?;
        let batch = envelope.into_batch(start, end, count as usize)?;
        info!("Fetched {} recipes from rows {}..={}", batch.len(), start, end);
        Ok(batch)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "COOKRCP01")]
    service: Option<ServiceBody>,
    #[serde(rename = "RESULT")]
    result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ServiceBody {
    #[serde(default)]
    total_count: Option<serde_json::Value>,
    #[serde(default)]
    row: Vec<RecipeRecord>,
    #[serde(rename = "RESULT")]
    result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "MSG", default)]
    message: String,
}

impl Envelope {
    fn into_batch(self, start: u32, end: u32, count: usize) -> Result<RecipeBatch, FetchError> {
        let result = self
            .service
            .as_ref()
            .and_then(|service| service.result.as_ref())
            .or(self.result.as_ref());

        match result {
            Some(result) if result.code == RESULT_OK => {}
            Some(result) if result.code == RESULT_NO_DATA => {
                return Err(FetchError::EmptyResult { start, end });
            }
            Some(result) => {
                return Err(FetchError::Api {
                    code: result.code.clone(),
                    message: result.message.clone(),
                });
            }
            None => {
                return Err(FetchError::Api {
                    code: "UNKNOWN".to_string(),
                    message: "response carried no result code".to_string(),
                });
            }
        }

        let Some(service) = self.service else {
            return Err(FetchError::EmptyResult { start, end });
        };

        let total_count = service.total_count.as_ref().and_then(parse_count);
        let mut rows = service.row;
        if rows.is_empty() {
            return Err(FetchError::EmptyResult { start, end });
        }
        if rows.len() > count {
            warn!(
                "API returned {} rows for a window of {}, dropping the surplus",
                rows.len(),
                count
            );
            rows.truncate(count);
        }

        Ok(RecipeBatch::new(rows).with_total_count(total_count))
    }
}

fn parse_count(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}
