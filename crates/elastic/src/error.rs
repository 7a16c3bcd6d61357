use borga_store::StoreError;
use log::error;
use thiserror::Error;

/// エラー型
#[derive(Error, Debug)]
pub enum ElasticError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error: {message} (Status: {status})")]
    ApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl From<ElasticError> for StoreError {
    fn from(err: ElasticError) -> Self {
        error!("document store request failed: {}", err);
        match err {
            ElasticError::ApiError { status, .. } if status.is_server_error() => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}
