//! Configuration options for the Borga service layer

use std::env;

use borga_catalog::AtlasOptions;
use borga_elastic::ElasticOptions;
use borga_store::{GuestUser, DEFAULT_POPULAR_LIMIT};
use url::Url;

use crate::error::Error;

/// Configuration options for [`crate::Borga`]
#[derive(Debug, Clone)]
pub struct BorgaOptions {
    /// Number of games returned by the popularity ranking
    pub popular_limit: usize,

    /// User seeded into the transient backend with a fixed token
    pub guest: Option<GuestUser>,

    /// Document-store backend settings
    pub elastic: ElasticOptions,

    /// Catalog settings
    pub atlas: AtlasOptions,
}

impl Default for BorgaOptions {
    fn default() -> Self {
        Self {
            popular_limit: DEFAULT_POPULAR_LIMIT,
            guest: None,
            elastic: ElasticOptions::default(),
            atlas: AtlasOptions::default(),
        }
    }
}

impl BorgaOptions {
    /// Read options from the process environment.
    ///
    /// `BORGA_ES_URL`, `BORGA_INDEX_PREFIX` and `ATLAS_CLIENT_ID` override the
    /// defaults; the guest is seeded only when `BORGA_GUEST_ID` and
    /// `BORGA_GUEST_TOKEN` are both set.
    pub fn from_env() -> Result<Self, Error> {
        let mut options = Self::default();

        if let Ok(url) = env::var("BORGA_ES_URL") {
            Url::parse(&url).map_err(|e| Error::fail(format!("BORGA_ES_URL: {}", e)))?;
            options.elastic = options.elastic.with_url(&url);
        }
        if let Ok(prefix) = env::var("BORGA_INDEX_PREFIX") {
            options.elastic = options.elastic.with_index_prefix(&prefix);
        }
        if let Ok(client_id) = env::var("ATLAS_CLIENT_ID") {
            options.atlas.client_id = client_id;
        }

        if let (Ok(id), Ok(token)) = (env::var("BORGA_GUEST_ID"), env::var("BORGA_GUEST_TOKEN")) {
            let name = env::var("BORGA_GUEST_NAME").unwrap_or_else(|_| id.clone());
            options.guest = Some(GuestUser { id, name, token });
        }

        Ok(options)
    }

    /// Set the popularity ranking length
    pub fn with_popular_limit(mut self, value: usize) -> Self {
        self.popular_limit = value;
        self
    }

    /// Set the seeded guest user
    pub fn with_guest(mut self, value: GuestUser) -> Self {
        self.guest = Some(value);
        self
    }

    /// Set the document-store options
    pub fn with_elastic(mut self, value: ElasticOptions) -> Self {
        self.elastic = value;
        self
    }

    /// Set the catalog options
    pub fn with_atlas(mut self, value: AtlasOptions) -> Self {
        self.atlas = value;
        self
    }
}
