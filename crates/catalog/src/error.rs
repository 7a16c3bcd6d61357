use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// エラー型
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Game not found: {0}")]
    NotFound(Value),

    /// The catalog answered with a server-side error
    #[error("Catalog unavailable: {message} (Status: {status})")]
    Upstream { status: StatusCode, message: String },

    #[error("Unexpected catalog response: {message} (Status: {status})")]
    Unexpected { status: StatusCode, message: String },
}

impl CatalogError {
    /// Whether the failure lies with the upstream service rather than the request
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            CatalogError::RequestError(_) | CatalogError::Upstream { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
