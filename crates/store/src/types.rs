//! Records shared by every backend

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// User identifier. Externally supplied and case-normalized on construction,
/// so `"Ann"` and `"ann"` name the same user.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: &str) -> Self {
        Self(raw.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// User record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Opaque to the store; produced and checked by the session layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_hash: Option<String>,
}

/// Parameters for creating a user
#[derive(Clone, Debug)]
pub struct CreateUserParams {
    pub id: String,
    pub name: String,
    pub credential_hash: Option<String>,
}

impl CreateUserParams {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            credential_hash: None,
        }
    }

    pub fn with_credential_hash(mut self, hash: &str) -> Self {
        self.credential_hash = Some(hash.to_string());
        self
    }
}

/// Identity returned on registration, including the freshly minted token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: UserId,
    pub user_name: String,
    pub token: String,
}

/// A user seeded into the transient backend with a well-known token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestUser {
    pub id: String,
    pub name: String,
    pub token: String,
}

/// Parameters for creating a group
#[derive(Clone, Debug)]
pub struct CreateGroupParams {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl CreateGroupParams {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Group metadata without its games
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Entry of a user's group listing, keyed by group id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub description: String,
}

/// Full view of a group: metadata plus `game id -> game name`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetails {
    pub id: String,
    pub name: String,
    pub description: String,
    pub games: BTreeMap<String, String>,
}

/// Catalog snapshot of a board game, cached by id in the global game table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amazon_rank: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default)]
    pub mechanics: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl GameRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: None,
            image_url: None,
            publisher: None,
            amazon_rank: None,
            price: None,
            mechanics: Vec::new(),
            categories: Vec::new(),
        }
    }
}

/// Mints a fresh bearer token (random UUID v4).
pub fn new_token() -> String {
    Uuid::new_v4().to_string()
}
