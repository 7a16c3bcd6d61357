//! Cross-user popularity ranking, derived on every call from a full scan.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Serialize;

use crate::types::GameRecord;
use crate::{CollectionStore, StoreError};

/// Number of games returned by the popularity ranking.
pub const DEFAULT_POPULAR_LIMIT: usize = 20;

/// A ranked game and the number of distinct users collecting it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopularGame {
    pub game: GameRecord,
    pub count: usize,
}

impl PopularGame {
    pub fn id(&self) -> &str {
        &self.game.id
    }

    pub fn name(&self) -> &str {
        &self.game.name
    }
}

/// Occurrence counts kept in first-encountered order.
#[derive(Default)]
struct Tally {
    order: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn bump(&mut self, game_id: &str) {
        match self.index.get(game_id) {
            Some(&slot) => self.order[slot].1 += 1,
            None => {
                self.index.insert(game_id.to_string(), self.order.len());
                self.order.push((game_id.to_string(), 1));
            }
        }
    }

    /// Descending by count; the sort is stable so ties keep scan order.
    fn ranked(mut self, limit: usize) -> Vec<(String, usize)> {
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.order.truncate(limit);
        self.order
    }
}

/// Rank the games referenced by any group of any user.
///
/// A game counts once per user, however many of that user's groups hold it.
/// Ties keep scan order: users as the backend lists them, then groups by id,
/// then games by id.
/// Each backend read is a consistent snapshot but the scan as a whole is not:
/// users or groups deleted while the scan runs are skipped.
pub async fn popular_games<S: CollectionStore + ?Sized>(
    store: &S,
    limit: usize,
) -> Result<Vec<PopularGame>, StoreError> {
    let mut tally = Tally::default();

    for user_id in store.list_users().await? {
        let groups = match store.list_user_groups(&user_id).await {
            Ok(groups) => groups,
            Err(e) if e.is_not_found() => {
                debug!("user {} vanished during popularity scan", user_id);
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut seen = HashSet::new();
        for group_id in groups.keys() {
            let details = match store.get_group_details(&user_id, group_id).await {
                Ok(details) => details,
                Err(e) if e.is_not_found() => {
                    debug!("group {}/{} vanished during popularity scan", user_id, group_id);
                    continue;
                }
                Err(e) => return Err(e),
            };
            for game_id in details.games.keys() {
                if seen.insert(game_id.clone()) {
                    tally.bump(game_id);
                }
            }
        }
    }

    let ranked = tally.ranked(limit);
    let mut popular = Vec::with_capacity(ranked.len());
    for (game_id, count) in ranked {
        match store.get_game(&game_id).await {
            Ok(game) => popular.push(PopularGame { game, count }),
            Err(e) if e.is_not_found() => {
                warn!("game {} referenced by a group is missing from the game table", game_id);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(popular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CreateGroupParams, CreateUserParams, MemoryStore, UserId};

    async fn user_with_games(store: &MemoryStore, user: &str, groups: &[(&str, Vec<&str>)]) {
        let info = store
            .create_user(&CreateUserParams::new(user, user))
            .await
            .unwrap();
        for (group_id, games) in groups {
            store
                .create_group(&info.user_id, &CreateGroupParams::new(group_id, "n", "d"))
                .await
                .unwrap();
            for game_id in games.iter() {
                let game = GameRecord::new(game_id, &format!("Game {}", game_id));
                store
                    .add_game_to_group(&info.user_id, group_id, &game)
                    .await
                    .unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_empty_store_has_no_popular_games() {
        let store = MemoryStore::new();
        let popular = popular_games(&store, DEFAULT_POPULAR_LIMIT).await.unwrap();
        assert!(popular.is_empty());
    }

    #[tokio::test]
    async fn test_game_collected_by_two_users_ranks_first() {
        let store = MemoryStore::new();
        user_with_games(&store, "a1", &[("g1", vec!["solo", "shared"])]).await;
        user_with_games(&store, "b2", &[("g1", vec!["shared"])]).await;

        let popular = popular_games(&store, DEFAULT_POPULAR_LIMIT).await.unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].id(), "shared");
        assert_eq!(popular[0].count, 2);
        assert_eq!(popular[0].name(), "Game shared");
        assert_eq!(popular[1].id(), "solo");
        assert_eq!(popular[1].count, 1);
    }

    #[tokio::test]
    async fn test_same_game_in_two_groups_of_one_user_counts_once() {
        let store = MemoryStore::new();
        user_with_games(&store, "a1", &[("g1", vec!["twice"]), ("g2", vec!["twice"])]).await;
        user_with_games(&store, "b2", &[("g1", vec!["other"])]).await;
        user_with_games(&store, "c3", &[("g1", vec!["other"])]).await;

        let popular = popular_games(&store, DEFAULT_POPULAR_LIMIT).await.unwrap();
        assert_eq!(popular[0].id(), "other");
        assert_eq!(popular[0].count, 2);
        assert_eq!(popular[1].id(), "twice");
        assert_eq!(popular[1].count, 1);
    }

    #[tokio::test]
    async fn test_ties_keep_first_encountered_order() {
        let store = MemoryStore::new();
        // Users are scanned in id order, games in id order within a group.
        user_with_games(&store, "a1", &[("g1", vec!["zeta"])]).await;
        user_with_games(&store, "b2", &[("g1", vec!["alpha"])]).await;

        let popular = popular_games(&store, DEFAULT_POPULAR_LIMIT).await.unwrap();
        let ids: Vec<&str> = popular.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_ties_within_one_user_follow_id_order() {
        let store = MemoryStore::new();
        let groups = [("g2", vec!["zeta"]), ("g1", vec!["mid", "alpha"])];
        user_with_games(&store, "a1", &groups).await;

        let popular = popular_games(&store, DEFAULT_POPULAR_LIMIT).await.unwrap();
        let ids: Vec<&str> = popular.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_ranking_is_truncated_to_limit() {
        let store = MemoryStore::new();
        let ids: Vec<String> = (0..25).map(|i| format!("game{:02}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        user_with_games(&store, "a1", &[("g1", refs)]).await;

        let popular = popular_games(&store, DEFAULT_POPULAR_LIMIT).await.unwrap();
        assert_eq!(popular.len(), DEFAULT_POPULAR_LIMIT);
        assert_eq!(popular[0].id(), "game00");
    }

    #[tokio::test]
    async fn test_ranking_reflects_current_state() {
        let store = MemoryStore::new();
        user_with_games(&store, "a1", &[("g1", vec!["x"])]).await;
        assert_eq!(popular_games(&store, 20).await.unwrap().len(), 1);

        store
            .remove_game_from_group(&UserId::new("a1"), "g1", "x")
            .await
            .unwrap();
        assert!(popular_games(&store, 20).await.unwrap().is_empty());
    }
}
