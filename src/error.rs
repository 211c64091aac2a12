use std::fmt;

use thiserror::Error;

/// Errors that can occur while fetching a batch of recipes
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure or a non-2xx HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered but reported a logical failure
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// The requested window contained no rows
    #[error("No recipes found in rows {start}..={end}")]
    EmptyResult { start: u32, end: u32 },

    /// The requested window falls outside the rows the API declares
    #[error("Invalid row window: start {start}, count {count} (max row {max_row})")]
    InvalidWindow { start: u32, count: u32, max_row: u32 },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network(_) => ErrorKind::Network,
            FetchError::Api { .. } => ErrorKind::Api,
            FetchError::EmptyResult { .. } => ErrorKind::EmptyResult,
            FetchError::InvalidWindow { .. } => ErrorKind::InvalidWindow,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Classification of a [`FetchError`], kept by the session after a failed load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Api,
    EmptyResult,
    InvalidWindow,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Api => "api",
            ErrorKind::EmptyResult => "empty result",
            ErrorKind::InvalidWindow => "invalid window",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the binary
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to build the recipe client
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Terminal I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
