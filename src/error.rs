use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for AnalyticsError {
    fn from(err: polars::error::PolarsError) -> Self {
        AnalyticsError::Polars(err.to_string())
    }
}

impl From<calamine::Error> for AnalyticsError {
    fn from(err: calamine::Error) -> Self {
        AnalyticsError::DataUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
