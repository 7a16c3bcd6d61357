//! Borga - board game collections
//!
//! Registered users curate groups of board games drawn from an external
//! catalog, and the service ranks the games most often collected across all
//! users.
//!
//! [`Borga`] is the service layer. Every call runs validation first, then
//! the token [`Gate`](gate::Gate), then the collection store (resolving games
//! through the catalog where needed), so a rejected call never touches state.
//!
//! ```no_run
//! use std::sync::Arc;
//! use borga::prelude::*;
//! use borga::catalog::StubCatalog;
//!
//! # async fn run() -> Result<(), borga::error::Error> {
//! let catalog = StubCatalog::default().with_game(GameRecord::new("OIXt3DmJU0", "Catan"));
//! let borga = Borga::in_memory(Arc::new(catalog), BorgaOptions::default());
//!
//! let ann = borga.create_user("a1", "Ann").await?;
//! let token = Some(ann.token.as_str());
//! borga.create_group(token, "a1", Some("g1"), "RPG", "desc").await?;
//! borga.add_game_to_group(token, "a1", "g1", "OIXt3DmJU0").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod validation;

pub use borga_catalog as catalog;
pub use borga_elastic as elastic;
pub use borga_store as store;

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use reqwest::Client;

use borga_catalog::{AtlasClient, Catalog};
use borga_elastic::ElasticStore;
use borga_store::{
    new_token, popular_games, CollectionStore, CreateGroupParams, CreateUserParams, GameRecord,
    GroupDetails, GroupInfo, GroupSummary, MemoryStore, PopularGame, Store, User, UserInfo,
};

pub use crate::error::{Error, ErrorKind};

use crate::config::BorgaOptions;
use crate::gate::Gate;
use crate::validation::Validator;

/// The service layer over a collection store and a catalog
#[derive(Clone)]
pub struct Borga {
    store: Arc<dyn Store>,
    catalog: Arc<dyn Catalog>,
    gate: Gate,
    options: BorgaOptions,
}

impl Borga {
    /// Wire a service over any backend and catalog
    pub fn new(store: Arc<dyn Store>, catalog: Arc<dyn Catalog>, options: BorgaOptions) -> Self {
        let gate = Gate::new(Arc::clone(&store));
        Self {
            store,
            catalog,
            gate,
            options,
        }
    }

    /// Transient backend, seeded with the configured guest if any
    pub fn in_memory(catalog: Arc<dyn Catalog>, options: BorgaOptions) -> Self {
        let store = match &options.guest {
            Some(guest) => MemoryStore::with_guest(guest.clone()),
            None => MemoryStore::new(),
        };
        Self::new(Arc::new(store), catalog, options)
    }

    /// Document-store backend and the Board Game Atlas catalog, sharing one HTTP client
    pub fn elastic(options: BorgaOptions) -> Self {
        let http_client = Client::new();
        let store = ElasticStore::with_client(options.elastic.clone(), http_client.clone());
        let catalog = AtlasClient::new(options.atlas.clone(), http_client);
        Self::new(Arc::new(store), Arc::new(catalog), options)
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn options(&self) -> &BorgaOptions {
        &self.options
    }

    // ───────────────────────────────────── Public ─────────────────────────────────────────

    /// The games most often collected across all users
    pub async fn popular_games(&self) -> Result<Vec<PopularGame>, Error> {
        Ok(popular_games(self.store.as_ref(), self.options.popular_limit).await?)
    }

    /// Every catalog game matching `name`
    pub async fn search_games_by_name(&self, name: &str) -> Result<Vec<GameRecord>, Error> {
        Validator::new().require_str("gameName", Some(name)).finish()?;
        Ok(self.catalog.search_by_name(name, None).await?)
    }

    /// The catalog's own ranking
    pub async fn world_popular_games(&self) -> Result<Vec<GameRecord>, Error> {
        let limit = u32::try_from(self.options.popular_limit).unwrap_or(u32::MAX);
        Ok(self.catalog.list_popular(limit).await?)
    }

    // ───────────────────────────────────── Users ──────────────────────────────────────────

    /// Register a user and return its first token
    pub async fn create_user(&self, user_id: &str, user_name: &str) -> Result<UserInfo, Error> {
        Validator::new()
            .require_str("userId", Some(user_id))
            .require_str("userName", Some(user_name))
            .finish()?;

        let user = self
            .store
            .create_user(&CreateUserParams::new(user_id, user_name))
            .await?;
        info!("registered user {}", user.user_id);
        Ok(user)
    }

    /// Delete the token owner together with its groups and tokens
    pub async fn delete_user(&self, token: Option<&str>, user_id: &str) -> Result<User, Error> {
        Validator::new().require_str("userId", Some(user_id)).finish()?;
        let user_id = self.gate.check(token, user_id).await?;

        let user = self.store.delete_user(&user_id).await?;
        info!("deleted user {}", user_id);
        Ok(user)
    }

    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// Create a group; a random id is assigned when `group_id` is absent or empty
    pub async fn create_group(
        &self,
        token: Option<&str>,
        user_id: &str,
        group_id: Option<&str>,
        name: &str,
        description: &str,
    ) -> Result<GroupInfo, Error> {
        Validator::new()
            .require_str("groupName", Some(name))
            .require_str("groupDescription", Some(description))
            .finish()?;
        let user_id = self.gate.check(token, user_id).await?;

        let group_id = match group_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => new_token(),
        };
        let params = CreateGroupParams::new(&group_id, name, description);
        Ok(self.store.create_group(&user_id, &params).await?)
    }

    /// Rename and/or redescribe a group; `None` or empty keeps the stored value
    pub async fn edit_group(
        &self,
        token: Option<&str>,
        user_id: &str,
        group_id: &str,
        new_name: Option<&str>,
        new_description: Option<&str>,
    ) -> Result<GroupInfo, Error> {
        Validator::new().require_str("groupId", Some(group_id)).finish()?;
        let user_id = self.gate.check(token, user_id).await?;

        Ok(self
            .store
            .edit_group(&user_id, group_id, new_name, new_description)
            .await?)
    }

    pub async fn list_user_groups(
        &self,
        token: Option<&str>,
        user_id: &str,
    ) -> Result<BTreeMap<String, GroupSummary>, Error> {
        let user_id = self.gate.check(token, user_id).await?;
        Ok(self.store.list_user_groups(&user_id).await?)
    }

    pub async fn delete_group(
        &self,
        token: Option<&str>,
        user_id: &str,
        group_id: &str,
    ) -> Result<GroupInfo, Error> {
        Validator::new().require_str("groupId", Some(group_id)).finish()?;
        let user_id = self.gate.check(token, user_id).await?;
        Ok(self.store.delete_group(&user_id, group_id).await?)
    }

    pub async fn group_details(
        &self,
        token: Option<&str>,
        user_id: &str,
        group_id: &str,
    ) -> Result<GroupDetails, Error> {
        Validator::new().require_str("groupId", Some(group_id)).finish()?;
        let user_id = self.gate.check(token, user_id).await?;
        Ok(self.store.get_group_details(&user_id, group_id).await?)
    }

    // ───────────────────────────────────── Games ──────────────────────────────────────────

    /// Resolve `game_id` through the catalog and reference it from the group
    pub async fn add_game_to_group(
        &self,
        token: Option<&str>,
        user_id: &str,
        group_id: &str,
        game_id: &str,
    ) -> Result<GameRecord, Error> {
        Validator::new()
            .require_str("groupId", Some(group_id))
            .require_str("gameId", Some(game_id))
            .finish()?;
        let user_id = self.gate.check(token, user_id).await?;

        // Fail on a bad group before spending a catalog round trip.
        self.store.get_group(&user_id, group_id).await?;
        let game = self.catalog.resolve_by_id(game_id).await?;
        Ok(self.store.add_game_to_group(&user_id, group_id, &game).await?)
    }

    pub async fn remove_game_from_group(
        &self,
        token: Option<&str>,
        user_id: &str,
        group_id: &str,
        game_id: &str,
    ) -> Result<GameRecord, Error> {
        Validator::new()
            .require_str("groupId", Some(group_id))
            .require_str("gameId", Some(game_id))
            .finish()?;
        let user_id = self.gate.check(token, user_id).await?;
        Ok(self
            .store
            .remove_game_from_group(&user_id, group_id, game_id)
            .await?)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::BorgaOptions;
    pub use crate::error::{Error, ErrorKind};
    pub use crate::Borga;
    pub use borga_catalog::Catalog;
    pub use borga_store::{GameRecord, GroupDetails, GroupInfo, PopularGame, Store, UserInfo};
}
