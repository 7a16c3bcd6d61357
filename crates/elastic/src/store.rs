//! `CollectionStore` and `TokenStore` over Elasticsearch indices

use std::collections::BTreeMap;

use borga_store::{
    new_token, CollectionStore, CreateGroupParams, CreateUserParams, GameRecord, GroupDetails,
    GroupInfo, GroupSummary, StoreError, TokenStore, User, UserId, UserInfo,
};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::document::DocumentClient;
use crate::error::ElasticError;
use crate::index::IndexNames;
use crate::options::ElasticOptions;

#[derive(Debug, Serialize, Deserialize)]
struct UserDoc {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential_hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupDoc {
    name: String,
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupGameDoc {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenDoc {
    user_id: String,
}

/// Document-store backend.
///
/// Per-document writes are acknowledged only once visible to reads; nothing
/// spanning several documents is atomic.
pub struct ElasticStore {
    docs: DocumentClient,
    names: IndexNames,
}

impl ElasticStore {
    /// Create a store with its own HTTP client
    pub fn new(options: ElasticOptions) -> Self {
        Self::with_client(options, Client::new())
    }

    /// Create a store sharing an existing HTTP client
    pub fn with_client(options: ElasticOptions, http_client: Client) -> Self {
        let names = IndexNames::new(&options.index_prefix);
        Self {
            docs: DocumentClient::new(&options, http_client),
            names,
        }
    }

    pub fn index_names(&self) -> &IndexNames {
        &self.names
    }

    async fn require_user(&self, user_id: &UserId) -> Result<UserDoc, StoreError> {
        self.docs
            .get::<UserDoc>(&self.names.users(), user_id.as_str())
            .await?
            .ok_or_else(|| StoreError::not_found("userId", user_id.as_str()))
    }

    async fn require_group(
        &self,
        user_id: &UserId,
        group_id: &str,
    ) -> Result<GroupDoc, StoreError> {
        self.require_user(user_id).await?;
        self.docs
            .get::<GroupDoc>(&self.names.user_groups(user_id), group_id)
            .await?
            .ok_or_else(|| StoreError::not_found("groupId", group_id))
    }

    async fn require_game(&self, game_id: &str) -> Result<GameRecord, StoreError> {
        self.docs
            .get::<GameRecord>(&self.names.games(), game_id)
            .await?
            .ok_or_else(|| StoreError::not_found("gameId", game_id))
    }

    /// Cascade children first so an interrupted delete leaves the user document
    /// in place and can simply be run again.
    async fn cascade_user(&self, user_id: &UserId) -> Result<(), (&'static str, ElasticError)> {
        let groups_index = self.names.user_groups(user_id);

        let groups = self
            .docs
            .search::<GroupDoc>(&groups_index)
            .await
            .map_err(|e| ("groups", e))?;
        for (group_id, _) in &groups {
            self.docs
                .delete_index(&self.names.group_games(user_id, group_id))
                .await
                .map_err(|e| ("group_games", e))?;
        }
        self.docs
            .delete_index(&groups_index)
            .await
            .map_err(|e| ("groups", e))?;

        let query = json!({ "query": { "term": { "user_id.keyword": user_id.as_str() } } });
        let revoked = self
            .docs
            .delete_by_query(&self.names.tokens(), &query)
            .await
            .map_err(|e| ("tokens", e))?;
        debug!("revoked {} tokens of {}", revoked, user_id);

        self.docs
            .delete(&self.names.users(), user_id.as_str())
            .await
            .map_err(|e| ("user", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CollectionStore for ElasticStore {
    async fn create_user(&self, params: &CreateUserParams) -> Result<UserInfo, StoreError> {
        let user_id = UserId::new(&params.id);
        let doc = UserDoc {
            name: params.name.clone(),
            credential_hash: params.credential_hash.clone(),
        };
        if !self
            .docs
            .create(&self.names.users(), user_id.as_str(), &doc)
            .await?
        {
            return Err(StoreError::already_exists("userId", user_id.as_str()));
        }

        let token = match self.create_token(&user_id).await {
            Ok(token) => token,
            Err(e) => {
                // A user without a token can never authenticate; free the id.
                warn!("token for new user {} failed, rolling back: {}", user_id, e);
                let users = self.names.users();
                if let Err(rollback) = self.docs.delete(&users, user_id.as_str()).await {
                    warn!("rollback of user {} failed: {}", user_id, rollback);
                }
                return Err(e);
            }
        };
        Ok(UserInfo {
            user_id,
            user_name: params.name.clone(),
            token,
        })
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        let doc = self.require_user(user_id).await?;
        Ok(User {
            id: user_id.clone(),
            name: doc.name,
            credential_hash: doc.credential_hash,
        })
    }

    async fn list_users(&self) -> Result<Vec<UserId>, StoreError> {
        let users = self.docs.search::<UserDoc>(&self.names.users()).await?;
        Ok(users.into_iter().map(|(id, _)| UserId::new(&id)).collect())
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        let user = self.get_user(user_id).await?;

        if let Err((stage, cause)) = self.cascade_user(user_id).await {
            warn!("delete of user {} stopped at stage {}: {}", user_id, stage, cause);
            return Err(StoreError::Interrupted(json!({
                "userId": user_id.as_str(),
                "stage": stage,
                "cause": cause.to_string(),
            })));
        }
        Ok(user)
    }

    async fn create_group(
        &self,
        user_id: &UserId,
        params: &CreateGroupParams,
    ) -> Result<GroupInfo, StoreError> {
        self.require_user(user_id).await?;

        let doc = GroupDoc {
            name: params.name.clone(),
            description: params.description.clone(),
        };
        if !self
            .docs
            .create(&self.names.user_groups(user_id), &params.id, &doc)
            .await?
        {
            return Err(StoreError::already_exists("groupId", &params.id));
        }

        Ok(GroupInfo {
            id: params.id.clone(),
            name: doc.name,
            description: doc.description,
        })
    }

    async fn edit_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<GroupInfo, StoreError> {
        let current = self.require_group(user_id, group_id).await?;

        // Both fields live in one document, so the overwrite is atomic.
        let doc = GroupDoc {
            name: name
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(current.name),
            description: description
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(current.description),
        };
        self.docs
            .put(&self.names.user_groups(user_id), group_id, &doc)
            .await?;

        Ok(GroupInfo {
            id: group_id.to_string(),
            name: doc.name,
            description: doc.description,
        })
    }

    async fn get_group(&self, user_id: &UserId, group_id: &str) -> Result<GroupInfo, StoreError> {
        let group = self.require_group(user_id, group_id).await?;
        Ok(GroupInfo {
            id: group_id.to_string(),
            name: group.name,
            description: group.description,
        })
    }

    async fn list_user_groups(
        &self,
        user_id: &UserId,
    ) -> Result<BTreeMap<String, GroupSummary>, StoreError> {
        self.require_user(user_id).await?;

        let groups = self
            .docs
            .search::<GroupDoc>(&self.names.user_groups(user_id))
            .await?;
        Ok(groups
            .into_iter()
            .map(|(id, doc)| {
                let summary = GroupSummary {
                    name: doc.name,
                    description: doc.description,
                };
                (id, summary)
            })
            .collect())
    }

    async fn delete_group(
        &self,
        user_id: &UserId,
        group_id: &str,
    ) -> Result<GroupInfo, StoreError> {
        let group = self.require_group(user_id, group_id).await?;

        // Games first: a stray games index would otherwise leak into a
        // group later created with the same id.
        self.docs
            .delete_index(&self.names.group_games(user_id, group_id))
            .await?;
        if !self
            .docs
            .delete(&self.names.user_groups(user_id), group_id)
            .await?
        {
            return Err(StoreError::not_found("groupId", group_id));
        }

        Ok(GroupInfo {
            id: group_id.to_string(),
            name: group.name,
            description: group.description,
        })
    }

    async fn get_group_details(
        &self,
        user_id: &UserId,
        group_id: &str,
    ) -> Result<GroupDetails, StoreError> {
        let group = self.require_group(user_id, group_id).await?;

        let games = self
            .docs
            .search::<GroupGameDoc>(&self.names.group_games(user_id, group_id))
            .await?;
        Ok(GroupDetails {
            id: group_id.to_string(),
            name: group.name,
            description: group.description,
            games: games.into_iter().map(|(id, doc)| (id, doc.name)).collect(),
        })
    }

    async fn add_game_to_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        game: &GameRecord,
    ) -> Result<GameRecord, StoreError> {
        self.require_group(user_id, group_id).await?;

        self.docs.put(&self.names.games(), &game.id, game).await?;
        let reference = GroupGameDoc {
            name: game.name.clone(),
        };
        self.docs
            .put(&self.names.group_games(user_id, group_id), &game.id, &reference)
            .await?;

        Ok(game.clone())
    }

    async fn remove_game_from_group(
        &self,
        user_id: &UserId,
        group_id: &str,
        game_id: &str,
    ) -> Result<GameRecord, StoreError> {
        self.require_group(user_id, group_id).await?;

        let games_index = self.names.group_games(user_id, group_id);
        if self
            .docs
            .get::<GroupGameDoc>(&games_index, game_id)
            .await?
            .is_none()
        {
            return Err(StoreError::not_found("gameId", game_id));
        }
        let game = self.require_game(game_id).await?;

        if !self.docs.delete(&games_index, game_id).await? {
            return Err(StoreError::not_found("gameId", game_id));
        }
        Ok(game)
    }

    async fn get_game(&self, game_id: &str) -> Result<GameRecord, StoreError> {
        self.require_game(game_id).await
    }
}

#[async_trait::async_trait]
impl TokenStore for ElasticStore {
    async fn create_token(&self, user_id: &UserId) -> Result<String, StoreError> {
        self.require_user(user_id).await?;

        let token = new_token();
        let doc = TokenDoc {
            user_id: user_id.as_str().to_string(),
        };
        if !self.docs.create(&self.names.tokens(), &token, &doc).await? {
            return Err(StoreError::already_exists("token", &token));
        }
        Ok(token)
    }

    async fn token_to_user_id(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let doc = self
            .docs
            .get::<TokenDoc>(&self.names.tokens(), token)
            .await?;
        Ok(doc.map(|doc| UserId::new(&doc.user_id)))
    }
}
