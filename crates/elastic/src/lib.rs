//! Elasticsearch backend for the Borga collection store
//!
//! Every user, every user's groups and every group's games live in their own
//! index, named by concatenating a prefix with the owning ids
//! (`<prefix>_users_<user>_groups_<group>_games`). Dropping an index drops
//! everything owned through it in one call.
//!
//! Writes ask the engine to refresh before acknowledging (`refresh=wait_for`
//! by default) so a caller always reads its own writes.

mod document;
mod error;
mod index;
mod options;
mod store;

pub use error::ElasticError;
pub use index::{index_segment, IndexNames};
pub use options::{ElasticOptions, Refresh};
pub use store::ElasticStore;
