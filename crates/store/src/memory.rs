//! MemoryStore - in-process backend for tests and development.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::types::*;
use crate::{CollectionStore, StoreError, TokenStore};

struct GroupEntry {
    name: String,
    description: String,
    games: BTreeMap<String, String>,
}

impl GroupEntry {
    fn info(&self, id: &str) -> GroupInfo {
        GroupInfo {
            id: id.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

struct UserEntry {
    user: User,
    groups: BTreeMap<String, GroupEntry>,
}

impl UserEntry {
    fn group(&self, group_id: &str) -> Result<&GroupEntry, StoreError> {
        self.groups
            .get(group_id)
            .ok_or_else(|| StoreError::not_found("groupId", group_id))
    }

    fn group_mut(&mut self, group_id: &str) -> Result<&mut GroupEntry, StoreError> {
        self.groups
            .get_mut(group_id)
            .ok_or_else(|| StoreError::not_found("groupId", group_id))
    }
}

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, UserEntry>,
    games: HashMap<String, GameRecord>,
    tokens: HashMap<String, UserId>,
}

impl MemoryState {
    fn user(&self, user_id: &UserId) -> Result<&UserEntry, StoreError> {
        self.users
            .get(user_id)
            .ok_or_else(|| StoreError::not_found("userId", user_id.as_str()))
    }

    fn user_mut(&mut self, user_id: &UserId) -> Result<&mut UserEntry, StoreError> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found("userId", user_id.as_str()))
    }

    fn insert_user(&mut self, user: User, token: String) -> Result<UserInfo, StoreError> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::already_exists("userId", user.id.as_str()));
        }
        let info = UserInfo {
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            token: token.clone(),
        };
        self.tokens.insert(token, user.id.clone());
        self.users.insert(
            user.id.clone(),
            UserEntry {
                user,
                groups: BTreeMap::new(),
            },
        );
        Ok(info)
    }

    fn seeded(guest: Option<&GuestUser>) -> Result<Self, StoreError> {
        let mut state = Self::default();
        if let Some(guest) = guest {
            let user = User {
                id: UserId::new(&guest.id),
                name: guest.name.clone(),
                credential_hash: None,
            };
            state.insert_user(user, guest.token.clone())?;
        }
        Ok(state)
    }
}

/// In-memory backend: nested tables behind one lock, immediately consistent.
///
/// Each instance owns its tables, so tests construct their own store instead
/// of sharing a global one. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    guest: Option<GuestUser>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a guest user whose token is fixed.
    pub fn with_guest(guest: GuestUser) -> Self {
        // Seeding an empty state cannot collide.
        let state = MemoryState::seeded(Some(&guest)).unwrap_or_default();
        Self {
            state: Arc::new(RwLock::new(state)),
            guest: Some(guest),
        }
    }

    /// Discard everything and restore the seed this store was built with.
    pub fn reset(&self) -> Result<(), StoreError> {
        let fresh = MemoryState::seeded(self.guest.as_ref())?;
        *self.write()? = fresh;
        debug!("memory store reset");
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

#[async_trait::async_trait]
impl CollectionStore for MemoryStore {
    async fn create_user(&self, params: &CreateUserParams) -> Result<UserInfo, StoreError> {
        let user = User {
            id: UserId::new(&params.id),
            name: params.name.clone(),
            credential_hash: params.credential_hash.clone(),
        };
        self.write()?.insert_user(user, new_token())
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        Ok(self.read()?.user(user_id)?.user.clone())
    }

    async fn list_users(&self) -> Result<Vec<UserId>, StoreError> {
        Ok(self.read()?.users.keys().cloned().collect())
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        let mut state = self.write()?;
        let entry = state
            .users
            .remove(user_id)
            .ok_or_else(|| StoreError::not_found("userId", user_id.as_str()))?;
        state.tokens.retain(|_, owner| owner != user_id);
        Ok(entry.user)
    }

    async fn create_group(
        &self,
        user_id: &UserId,
        params: &CreateGroupParams,
    ) -> Result<GroupInfo, StoreError> {
        let mut state = self.write()?;
        let user = state.user_mut(user_id)?;
        if user.groups.contains_key(&params.id) {
            return Err(StoreError::already_exists("groupId", &params.id));
        }
        let group = GroupEntry {
            name: params.name.clone(),
            description: params.description.clone(),
            games: BTreeMap::new(),
        };
        let info = group.info(&params.id);
        user.groups.insert(params.id.clone(), group);
        Ok(info)
    }

    async fn edit_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<GroupInfo, StoreError> {
        let mut state = self.write()?;
        let group = state.user_mut(user_id)?.group_mut(group_id)?;
        if let Some(name) = name.filter(|v| !v.is_empty()) {
            group.name = name.to_string();
        }
        if let Some(description) = description.filter(|v| !v.is_empty()) {
            group.description = description.to_string();
        }
        Ok(group.info(group_id))
    }

    async fn get_group(&self, user_id: &UserId, group_id: &str) -> Result<GroupInfo, StoreError> {
        Ok(self.read()?.user(user_id)?.group(group_id)?.info(group_id))
    }

    async fn list_user_groups(
        &self,
        user_id: &UserId,
    ) -> Result<BTreeMap<String, GroupSummary>, StoreError> {
        let state = self.read()?;
        let groups = state
            .user(user_id)?
            .groups
            .iter()
            .map(|(id, group)| {
                let summary = GroupSummary {
                    name: group.name.clone(),
                    description: group.description.clone(),
                };
                (id.clone(), summary)
            })
            .collect();
        Ok(groups)
    }

    async fn delete_group(
        &self,
        user_id: &UserId,
        group_id: &str,
    ) -> Result<GroupInfo, StoreError> {
        let mut state = self.write()?;
        let group = state
            .user_mut(user_id)?
            .groups
            .remove(group_id)
            .ok_or_else(|| StoreError::not_found("groupId", group_id))?;
        Ok(group.info(group_id))
    }

    async fn get_group_details(
        &self,
        user_id: &UserId,
        group_id: &str,
    ) -> Result<GroupDetails, StoreError> {
        let state = self.read()?;
        let group = state.user(user_id)?.group(group_id)?;
        Ok(GroupDetails {
            id: group_id.to_string(),
            name: group.name.clone(),
            description: group.description.clone(),
            games: group.games.clone(),
        })
    }

    async fn add_game_to_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        game: &GameRecord,
    ) -> Result<GameRecord, StoreError> {
        let mut state = self.write()?;
        // Resolve the group before touching the game table so a bad id has no side effect.
        state.user(user_id)?.group(group_id)?;
        state.games.insert(game.id.clone(), game.clone());
        state
            .user_mut(user_id)?
            .group_mut(group_id)?
            .games
            .insert(game.id.clone(), game.name.clone());
        Ok(game.clone())
    }

    async fn remove_game_from_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        game_id: &str,
    ) -> Result<GameRecord, StoreError> {
        let mut state = self.write()?;
        state
            .user_mut(user_id)?
            .group_mut(group_id)?
            .games
            .remove(game_id)
            .ok_or_else(|| StoreError::not_found("gameId", game_id))?;
        state
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("gameId", game_id))
    }

    async fn get_game(&self, game_id: &str) -> Result<GameRecord, StoreError> {
        self.read()?
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("gameId", game_id))
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryStore {
    async fn create_token(&self, user_id: &UserId) -> Result<String, StoreError> {
        let mut state = self.write()?;
        state.user(user_id)?;
        let token = new_token();
        state.tokens.insert(token.clone(), user_id.clone());
        Ok(token)
    }

    async fn token_to_user_id(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.read()?.tokens.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catan() -> GameRecord {
        let mut game = GameRecord::new("OIXt3DmJU0", "Catan");
        game.publisher = Some("KOSMOS".to_string());
        game.mechanics = vec!["Trading".to_string()];
        game
    }

    async fn store_with_group() -> (MemoryStore, UserId) {
        let store = MemoryStore::new();
        let info = store
            .create_user(&CreateUserParams::new("u1", "N"))
            .await
            .unwrap();
        store
            .create_group(&info.user_id, &CreateGroupParams::new("g1", "RPG", "desc"))
            .await
            .unwrap();
        (store, info.user_id)
    }

    #[tokio::test]
    async fn test_create_user_twice_fails_and_keeps_state() {
        let store = MemoryStore::new();
        let first = store
            .create_user(&CreateUserParams::new("u1", "Ann"))
            .await
            .unwrap();

        let second = store
            .create_user(&CreateUserParams::new("U1", "Other"))
            .await;
        assert!(matches!(second, Err(StoreError::AlreadyExists(_))));

        let user = store.get_user(&UserId::new("u1")).await.unwrap();
        assert_eq!(user.name, "Ann");
        assert_eq!(store.list_users().await.unwrap().len(), 1);
        assert_eq!(
            store.token_to_user_id(&first.token).await.unwrap(),
            Some(UserId::new("u1"))
        );
    }

    #[tokio::test]
    async fn test_missing_user_and_group_are_not_found() {
        let (store, user_id) = store_with_group().await;

        let err = store.get_user(&UserId::new("ghost")).await.unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .create_group(&UserId::new("ghost"), &CreateGroupParams::new("g", "n", "d"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = store.get_group_details(&user_id, "nope").await.unwrap_err();
        assert!(err.is_not_found());

        let err = store.get_group(&user_id, "nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.get_group(&user_id, "g1").await.unwrap().name, "RPG");

        let err = store.list_user_groups(&UserId::new("ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_group_ids_are_unique_per_user_only() {
        let (store, user_id) = store_with_group().await;

        let dup = store
            .create_group(&user_id, &CreateGroupParams::new("g1", "Other", "x"))
            .await;
        assert!(matches!(dup, Err(StoreError::AlreadyExists(_))));

        let other = store
            .create_user(&CreateUserParams::new("u2", "M"))
            .await
            .unwrap();
        let group = store
            .create_group(&other.user_id, &CreateGroupParams::new("g1", "Mine", "y"))
            .await
            .unwrap();
        assert_eq!(group.name, "Mine");
    }

    #[tokio::test]
    async fn test_edit_group_keeps_omitted_fields() {
        let (store, user_id) = store_with_group().await;

        let unchanged = store.edit_group(&user_id, "g1", None, Some("")).await.unwrap();
        assert_eq!(unchanged.name, "RPG");
        assert_eq!(unchanged.description, "desc");

        let renamed = store
            .edit_group(&user_id, "g1", Some("Role playing"), None)
            .await
            .unwrap();
        assert_eq!(renamed.name, "Role playing");
        assert_eq!(renamed.description, "desc");

        let err = store.edit_group(&user_id, "g2", Some("x"), None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_add_game_is_idempotent() {
        let (store, user_id) = store_with_group().await;

        store.add_game_to_group(&user_id, "g1", &catan()).await.unwrap();
        store.add_game_to_group(&user_id, "g1", &catan()).await.unwrap();

        let details = store.get_group_details(&user_id, "g1").await.unwrap();
        assert_eq!(details.games.len(), 1);
        assert_eq!(details.games.get("OIXt3DmJU0"), Some(&"Catan".to_string()));
    }

    #[tokio::test]
    async fn test_add_game_to_missing_group_leaves_game_table_untouched() {
        let (store, user_id) = store_with_group().await;

        let err = store
            .add_game_to_group(&user_id, "nope", &catan())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_game("OIXt3DmJU0").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_remove_game_requires_a_reference_in_the_group() {
        let (store, user_id) = store_with_group().await;
        store
            .create_group(&user_id, &CreateGroupParams::new("g2", "Other", "d"))
            .await
            .unwrap();
        store.add_game_to_group(&user_id, "g1", &catan()).await.unwrap();

        // Known globally but not referenced by g2.
        let err = store
            .remove_game_from_group(&user_id, "g2", "OIXt3DmJU0")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let removed = store
            .remove_game_from_group(&user_id, "g1", "OIXt3DmJU0")
            .await
            .unwrap();
        assert_eq!(removed, catan());
        assert!(store
            .get_group_details(&user_id, "g1")
            .await
            .unwrap()
            .games
            .is_empty());
        assert_eq!(store.get_game("OIXt3DmJU0").await.unwrap(), catan());
    }

    #[tokio::test]
    async fn test_delete_group_keeps_global_game() {
        let (store, user_id) = store_with_group().await;
        store.add_game_to_group(&user_id, "g1", &catan()).await.unwrap();

        let deleted = store.delete_group(&user_id, "g1").await.unwrap();
        assert_eq!(deleted.name, "RPG");

        let err = store.get_group_details(&user_id, "g1").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.get_game("OIXt3DmJU0").await.unwrap().name, "Catan");

        let err = store.delete_group(&user_id, "g1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_groups_and_tokens() {
        let (store, user_id) = store_with_group().await;
        let token = store.create_token(&user_id).await.unwrap();

        store.delete_user(&user_id).await.unwrap();

        assert!(store.get_user(&user_id).await.unwrap_err().is_not_found());
        assert!(store
            .get_group_details(&user_id, "g1")
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(store.token_to_user_id(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_token_for_unknown_user_fails() {
        let store = MemoryStore::new();
        let err = store.create_token(&UserId::new("ghost")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.token_to_user_id("whatever").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reset_restores_guest_seed() {
        let guest = GuestUser {
            id: "guest".to_string(),
            name: "Guest".to_string(),
            token: "fz3zMebxQXybYskc567j5w".to_string(),
        };
        let store = MemoryStore::with_guest(guest.clone());
        store
            .create_user(&CreateUserParams::new("u1", "N"))
            .await
            .unwrap();
        store
            .create_group(&UserId::new("guest"), &CreateGroupParams::new("g", "n", "d"))
            .await
            .unwrap();

        store.reset().unwrap();

        assert_eq!(store.list_users().await.unwrap(), vec![UserId::new("guest")]);
        assert!(store
            .list_user_groups(&UserId::new("guest"))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store.token_to_user_id(&guest.token).await.unwrap(),
            Some(UserId::new("guest"))
        );
    }

    #[tokio::test]
    async fn test_separate_instances_do_not_share_state() {
        let a = MemoryStore::new();
        let b = MemoryStore::new();
        a.create_user(&CreateUserParams::new("u1", "N")).await.unwrap();
        assert!(b.list_users().await.unwrap().is_empty());
    }
}
