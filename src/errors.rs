use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl From<String> for DashboardError {
    fn from(s: String) -> Self {
        DashboardError::Unknown(s)
    }
}

impl From<&str> for DashboardError {
    fn from(s: &str) -> Self {
        DashboardError::Unknown(s.to_string())
    }
}
