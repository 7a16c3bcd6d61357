use std::time::Duration;

/// Configuration options for [`crate::AtlasClient`]
#[derive(Debug, Clone)]
pub struct AtlasOptions {
    /// API root, without the `/api` path
    pub base_url: String,

    /// Application key sent as `client_id` on every call
    pub client_id: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            base_url: "https://api.boardgameatlas.com".to_string(),
            client_id: String::new(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl AtlasOptions {
    /// Options for the public API with the given client id
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            ..Self::default()
        }
    }

    /// Set the API root
    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
