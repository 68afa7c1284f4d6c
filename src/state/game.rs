use super::AppState;
use crate::error::{GameError, GameResult};
use crate::game::{GameSnapshot, GameState, SharedGame};
use crate::protocol::ServerMessage;
use crate::types::*;
use std::sync::Arc;

impl AppState {
    /// Start a game between `human` and the automated side in `channel`.
    ///
    /// Returns the game and the side the human plays.
    pub async fn start_game(
        &self,
        channel: &str,
        human: &str,
        side: Option<Side>,
    ) -> GameResult<(Arc<SharedGame>, Side)> {
        // create() re-checks under the store's write lock
        if self.store.retrieve(channel).await.is_ok() {
            return Err(GameError::GameInProgress);
        }

        let assignment = match side {
            Some(side) => SideAssignment::Requested {
                participant: human.to_string(),
                side,
            },
            None => SideAssignment::Random,
        };

        let mut state = GameState::new(
            ulid::Ulid::new().to_string(),
            assignment,
            vec![self.config.bot_id.clone(), human.to_string()],
            self.clock.clone(),
        )?;
        state.set_automated(&self.config.bot_id)?;
        let human_side = state.side_of(human)?;
        let fen = state.fen();

        let game = Arc::new(SharedGame::new(state));
        self.store.create(channel, game.clone()).await?;

        tracing::info!(
            "Game {} started in {}: {} plays {}",
            game.id(),
            channel,
            human,
            human_side
        );

        self.broadcast_to_all(ServerMessage::GameStarted {
            channel: channel.to_string(),
            game_id: game.id().to_string(),
            human: human.to_string(),
            human_side,
            fen,
        });

        Ok((game, human_side))
    }

    /// End the channel's game on request
    pub async fn exit_game(&self, channel: &str) -> GameResult<GameId> {
        let game = self
            .store
            .remove(channel)
            .await
            .ok_or(GameError::NoActiveGame)?;

        tracing::info!("Game {} in {} exited", game.id(), channel);

        self.broadcast_to_all(ServerMessage::GameExited {
            channel: channel.to_string(),
            game_id: game.id().to_string(),
        });
        Ok(game.id().to_string())
    }

    pub async fn game_status(&self, channel: &str) -> GameResult<GameSnapshot> {
        let game = self.store.retrieve(channel).await?;
        Ok(game.snapshot().await)
    }

    /// Legal moves for the side to move, in coordinate notation
    pub async fn legal_moves(&self, channel: &str) -> GameResult<Vec<String>> {
        let game = self.store.retrieve(channel).await?;
        let state = game.lock().await;
        Ok(state.legal_moves().iter().map(|mv| mv.to_string()).collect())
    }
}
