//! Board game catalog client for Borga
//!
//! The collection store never talks to the catalog itself: the service layer
//! resolves a game through a [`Catalog`] and hands the resulting
//! [`GameRecord`] to the store, which keeps it as an immutable snapshot.
//!
//! [`AtlasClient`] speaks the Board Game Atlas search API; [`StubCatalog`]
//! answers from a fixed list of games for tests and development.

mod atlas;
mod error;
mod options;
mod stub;

pub use atlas::AtlasClient;
pub use borga_store::GameRecord;
pub use error::{CatalogError, Result};
pub use options::AtlasOptions;
pub use stub::StubCatalog;

use serde_json::json;

/// An async lookup service returning game records
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Every game matching `name`, in catalog order. No match is `NotFound`.
    async fn search_by_name(&self, name: &str, limit: Option<u32>) -> Result<Vec<GameRecord>>;

    /// The best match for `name`
    async fn resolve_by_name(&self, name: &str) -> Result<GameRecord> {
        self.search_by_name(name, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(json!({ "name": name })))
    }

    /// The game with catalog id `id`
    async fn resolve_by_id(&self, id: &str) -> Result<GameRecord>;

    /// The catalog's own ranking, independent of what users collect
    async fn list_popular(&self, limit: u32) -> Result<Vec<GameRecord>>;
}
