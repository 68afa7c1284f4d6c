//! Live games, one per channel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{GameError, GameResult};
use crate::game::SharedGame;
use crate::types::ChannelId;

/// Every operation takes the map lock once, so callers never see a half-updated slot.
/// The games handed out are not locked by the store.
#[derive(Clone, Default)]
pub struct GameStore {
    games: Arc<RwLock<HashMap<ChannelId, Arc<SharedGame>>>>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a game into the channel's slot, replacing whatever was there
    pub async fn store(&self, channel: &str, game: Arc<SharedGame>) {
        if let Some(previous) = self
            .games
            .write()
            .await
            .insert(channel.to_string(), game)
        {
            tracing::info!("Replaced game {} in channel {}", previous.id(), channel);
        }
    }

    /// Put a game into the slot only if the slot is empty
    pub async fn create(&self, channel: &str, game: Arc<SharedGame>) -> GameResult<()> {
        let mut games = self.games.write().await;
        if games.contains_key(channel) {
            return Err(GameError::GameInProgress);
        }
        games.insert(channel.to_string(), game);
        Ok(())
    }

    pub async fn retrieve(&self, channel: &str) -> GameResult<Arc<SharedGame>> {
        self.games
            .read()
            .await
            .get(channel)
            .cloned()
            .ok_or(GameError::NoActiveGame)
    }

    /// Empty the slot. Removing from an empty slot is fine.
    pub async fn remove(&self, channel: &str) -> Option<Arc<SharedGame>> {
        self.games.write().await.remove(channel)
    }

    /// Empty the slot only if it still holds game `game_id`
    pub async fn remove_if_current(&self, channel: &str, game_id: &str) -> bool {
        let mut games = self.games.write().await;
        match games.get(channel) {
            Some(game) if game.id() == game_id => {
                games.remove(channel);
                true
            }
            _ => false,
        }
    }

    pub async fn is_current(&self, channel: &str, game_id: &str) -> bool {
        self.games
            .read()
            .await
            .get(channel)
            .is_some_and(|game| game.id() == game_id)
    }

    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }
}
