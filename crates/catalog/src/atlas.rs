//! Board Game Atlas search API client

use std::collections::HashMap;

use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use url::Url;

use crate::error::{CatalogError, Result};
use crate::options::AtlasOptions;
use crate::{Catalog, GameRecord};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    games: Vec<AtlasGame>,
}

#[derive(Debug, Deserialize)]
struct AtlasGame {
    id: String,
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    primary_publisher: Option<NamedRef>,
    #[serde(default)]
    amazon_rank: Option<i64>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    mechanics: Vec<IdRef>,
    #[serde(default)]
    categories: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LookupEntry {
    id: String,
    name: String,
}

/// Which id → name list a lookup fetches
#[derive(Clone, Copy)]
enum Lookup {
    Mechanics,
    Categories,
}

impl Lookup {
    fn key(self) -> &'static str {
        match self {
            Lookup::Mechanics => "mechanics",
            Lookup::Categories => "categories",
        }
    }
}

/// Board Game Atlas クライアント
///
/// Mechanic and category names are fetched on first use and cached for the
/// life of the client.
pub struct AtlasClient {
    options: AtlasOptions,
    http_client: Client,
    mechanics: OnceCell<HashMap<String, String>>,
    categories: OnceCell<HashMap<String, String>>,
}

impl AtlasClient {
    /// 新しいクライアントを作成
    pub fn new(options: AtlasOptions, http_client: Client) -> Self {
        Self {
            options,
            http_client,
            mechanics: OnceCell::new(),
            categories: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &AtlasOptions {
        &self.options
    }

    async fn search(&self, query: &[(&str, String)], lookup: Value) -> Result<Vec<GameRecord>> {
        let response: SearchResponse = self.fetch(&["search"], query, &lookup).await?;
        if response.games.is_empty() {
            return Err(CatalogError::NotFound(lookup));
        }

        let mechanics = self.names(Lookup::Mechanics).await?;
        let categories = self.names(Lookup::Categories).await?;
        Ok(response
            .games
            .into_iter()
            .map(|game| to_record(game, mechanics, categories))
            .collect())
    }

    async fn names(&self, lookup: Lookup) -> Result<&HashMap<String, String>> {
        let cell = match lookup {
            Lookup::Mechanics => &self.mechanics,
            Lookup::Categories => &self.categories,
        };
        cell.get_or_try_init(|| async move {
            let key = lookup.key();
            let mut lists: HashMap<String, Vec<LookupEntry>> = self
                .fetch(&["game", key], &[], &json!({ "lookup": key }))
                .await?;
            let entries = lists.remove(key).unwrap_or_default();
            debug!("cached {} {} names", entries.len(), key);
            Ok::<_, CatalogError>(entries.into_iter().map(|e| (e.id, e.name)).collect())
        })
        .await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&str, String)],
        lookup: &Value,
    ) -> Result<T> {
        let mut url = Url::parse(&self.options.base_url)?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::UrlError(url::ParseError::EmptyHost))?
            .pop_if_empty()
            .push("api")
            .extend(path);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("client_id", &self.options.client_id);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        debug!("GET /api/{}", path.join("/"));

        let mut request = self.http_client.get(url);
        if let Some(timeout) = self.options.request_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        if status.is_server_error() {
            warn!("catalog answered {}: {}", status, message);
            Err(CatalogError::Upstream { status, message })
        } else if status.is_client_error() {
            Err(CatalogError::NotFound(lookup.clone()))
        } else {
            Err(CatalogError::Unexpected { status, message })
        }
    }
}

fn to_record(
    game: AtlasGame,
    mechanics: &HashMap<String, String>,
    categories: &HashMap<String, String>,
) -> GameRecord {
    let resolve = |ids: Vec<IdRef>, names: &HashMap<String, String>| -> Vec<String> {
        ids.into_iter()
            .map(|r| names.get(&r.id).cloned().unwrap_or(r.id))
            .collect()
    };

    GameRecord {
        publisher: game.primary_publisher.and_then(|p| p.name),
        amazon_rank: game.amazon_rank,
        price: game.price.and_then(|price| match price {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }),
        mechanics: resolve(game.mechanics, mechanics),
        categories: resolve(game.categories, categories),
        url: game.url,
        image_url: game.image_url,
        id: game.id,
        name: game.name,
    }
}

#[async_trait::async_trait]
impl Catalog for AtlasClient {
    async fn search_by_name(&self, name: &str, limit: Option<u32>) -> Result<Vec<GameRecord>> {
        let mut query = vec![("name", name.to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.search(&query, json!({ "name": name })).await
    }

    async fn resolve_by_id(&self, id: &str) -> Result<GameRecord> {
        let lookup = json!({ "gameId": id });
        let games = self.search(&[("ids", id.to_string())], lookup.clone()).await?;
        games
            .into_iter()
            .find(|game| game.id == id)
            .ok_or(CatalogError::NotFound(lookup))
    }

    async fn list_popular(&self, limit: u32) -> Result<Vec<GameRecord>> {
        let query = [
            ("order_by", "rank".to_string()),
            ("limit", limit.to_string()),
        ];
        self.search(&query, json!({ "limit": limit })).await
    }
}
