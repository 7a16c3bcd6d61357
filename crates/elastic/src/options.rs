//! Configuration options for the document-store backend

use std::time::Duration;

/// When a write becomes visible to searches, relative to its acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Block the acknowledgement until the write is searchable
    WaitFor,

    /// Force a refresh immediately after the write
    Immediate,

    /// Let the engine refresh on its own schedule
    Disabled,
}

impl Refresh {
    /// Convert the option to its query parameter value
    pub fn as_str(&self) -> &'static str {
        match self {
            Refresh::WaitFor => "wait_for",
            Refresh::Immediate => "true",
            Refresh::Disabled => "false",
        }
    }

    /// `_delete_by_query` only accepts a boolean refresh
    pub fn as_bool_str(&self) -> &'static str {
        match self {
            Refresh::Disabled => "false",
            _ => "true",
        }
    }
}

/// Configuration options for [`crate::ElasticStore`]
#[derive(Debug, Clone)]
pub struct ElasticOptions {
    /// Base URL of the cluster, e.g. `http://localhost:9200`
    pub url: String,

    /// Prefix of every index name
    pub index_prefix: String,

    /// Refresh policy sent with every write
    pub refresh: Refresh,

    /// `size` sent with every search, so full scans are not cut at the engine default of 10
    pub search_size: u32,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for ElasticOptions {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index_prefix: "borga".to_string(),
            refresh: Refresh::WaitFor,
            search_size: 1000,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ElasticOptions {
    /// Options pointing at `url` with every other value defaulted
    pub fn new(url: &str) -> Self {
        Self::default().with_url(url)
    }

    /// Set the cluster URL
    pub fn with_url(mut self, value: &str) -> Self {
        self.url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the index prefix
    pub fn with_index_prefix(mut self, value: &str) -> Self {
        self.index_prefix = value.to_string();
        self
    }

    /// Set the refresh policy
    pub fn with_refresh(mut self, value: Refresh) -> Self {
        self.refresh = value;
        self
    }

    /// Set the search size
    pub fn with_search_size(mut self, value: u32) -> Self {
        self.search_size = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
