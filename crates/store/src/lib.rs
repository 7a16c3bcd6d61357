//! Collection store for Borga
//!
//! This crate owns the data model (users, their groups and the games each
//! group references), the storage contracts every backend implements, the
//! transient in-process backend and the cross-user popularity aggregation.
//!
//! # Features
//!
//! - `CollectionStore` / `TokenStore` contracts (`Store` is both)
//! - `MemoryStore`, an in-process backend
//! - `popular_games`, the derived popularity ranking

mod error;
mod memory;
mod popularity;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use popularity::{popular_games, PopularGame, DEFAULT_POPULAR_LIMIT};
pub use store::{CollectionStore, Store, TokenStore};
pub use types::*;
