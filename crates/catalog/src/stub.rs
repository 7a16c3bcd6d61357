//! StubCatalog - fixed game list for tests and development.

use reqwest::StatusCode;
use serde_json::json;

use crate::error::{CatalogError, Result};
use crate::{Catalog, GameRecord};

/// Answers from an in-process list of games, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StubCatalog {
    games: Vec<GameRecord>,
    unavailable: bool,
}

impl StubCatalog {
    pub fn new(games: Vec<GameRecord>) -> Self {
        Self {
            games,
            unavailable: false,
        }
    }

    /// Add a game to the list
    pub fn with_game(mut self, game: GameRecord) -> Self {
        self.games.push(game);
        self
    }

    /// A catalog whose every call fails as if the upstream were down
    pub fn unavailable() -> Self {
        Self {
            games: Vec::new(),
            unavailable: true,
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(CatalogError::Upstream {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "stub catalog is unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Catalog for StubCatalog {
    async fn search_by_name(&self, name: &str, limit: Option<u32>) -> Result<Vec<GameRecord>> {
        self.check_available()?;
        let needle = name.to_lowercase();
        let mut found: Vec<GameRecord> = self
            .games
            .iter()
            .filter(|game| game.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if let Some(limit) = limit {
            found.truncate(limit as usize);
        }
        if found.is_empty() {
            return Err(CatalogError::NotFound(json!({ "name": name })));
        }
        Ok(found)
    }

    async fn resolve_by_id(&self, id: &str) -> Result<GameRecord> {
        self.check_available()?;
        self.games
            .iter()
            .find(|game| game.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(json!({ "gameId": id })))
    }

    async fn list_popular(&self, limit: u32) -> Result<Vec<GameRecord>> {
        self.check_available()?;
        Ok(self.games.iter().take(limit as usize).cloned().collect())
    }
}
