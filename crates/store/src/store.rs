//! The contracts that backends implement.

use std::collections::BTreeMap;

use crate::types::*;
use crate::StoreError;

/// Users, their groups and the games each group references.
///
/// Every group and game operation is **scoped by user**: group ids are only
/// unique within their owner. Lookups of absent ids fail with
/// [`StoreError::NotFound`], never with an empty value.
#[async_trait::async_trait]
pub trait CollectionStore: Send + Sync {
    // ───────────────────────────────────── Users ──────────────────────────────────────────

    /// Create a user with no groups and mint its first token.
    /// Fails with `AlreadyExists` when the (normalized) id is taken.
    async fn create_user(&self, params: &CreateUserParams) -> Result<UserInfo, StoreError>;

    /// Get user by ID.
    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError>;

    /// List the ids of every user, in backend listing order.
    async fn list_users(&self) -> Result<Vec<UserId>, StoreError>;

    /// Delete a user together with its groups and tokens.
    async fn delete_user(&self, user_id: &UserId) -> Result<User, StoreError>;

    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// Create an empty group owned by `user_id`.
    async fn create_group(
        &self,
        user_id: &UserId,
        params: &CreateGroupParams,
    ) -> Result<GroupInfo, StoreError>;

    /// Partial update: `None` or empty values keep the stored field.
    async fn edit_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<GroupInfo, StoreError>;

    /// Get a group's metadata without reading its games.
    async fn get_group(&self, user_id: &UserId, group_id: &str) -> Result<GroupInfo, StoreError>;

    /// List a user's groups without their games.
    async fn list_user_groups(
        &self,
        user_id: &UserId,
    ) -> Result<BTreeMap<String, GroupSummary>, StoreError>;

    /// Delete a group and every game association it holds.
    async fn delete_group(&self, user_id: &UserId, group_id: &str)
        -> Result<GroupInfo, StoreError>;

    /// Get a group with its `game id -> name` associations.
    async fn get_group_details(
        &self,
        user_id: &UserId,
        group_id: &str,
    ) -> Result<GroupDetails, StoreError>;

    // ───────────────────────────────────── Games ──────────────────────────────────────────

    /// Upsert `game` into the global game table, then reference it from the group.
    /// Adding the same game twice is a no-op the second time.
    async fn add_game_to_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        game: &GameRecord,
    ) -> Result<GameRecord, StoreError>;

    /// Drop the group's reference to `game_id` and return the cached record.
    /// The global game table is left untouched.
    async fn remove_game_from_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        game_id: &str,
    ) -> Result<GameRecord, StoreError>;

    /// Get a cached game record from the global game table.
    async fn get_game(&self, game_id: &str) -> Result<GameRecord, StoreError>;
}

/// Opaque bearer tokens mapped to user identities.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Mint and persist a new token for an existing user.
    async fn create_token(&self, user_id: &UserId) -> Result<String, StoreError>;

    /// Resolve a token; `None` when the token is unknown.
    async fn token_to_user_id(&self, token: &str) -> Result<Option<UserId>, StoreError>;
}

/// A complete backend: collections plus tokens.
pub trait Store: CollectionStore + TokenStore {}

impl<T: CollectionStore + TokenStore + ?Sized> Store for T {}
