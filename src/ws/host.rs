//! Game lifecycle handlers
//!
//! Starting a game also spawns its polling loop.

use crate::game_loop::spawn_game_loop;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

pub async fn handle_start_game(
    state: &Arc<AppState>,
    channel: ChannelId,
    participant: ParticipantId,
    side: Option<Side>,
) -> Option<ServerMessage> {
    tracing::info!(
        "Start game in {} for {} (side {:?})",
        channel,
        participant,
        side
    );

    match state.start_game(&channel, &participant, side).await {
        Ok((game, _)) => {
            // GameStarted already went out on the broadcast
            spawn_game_loop(state.clone(), channel, game.id().to_string());
            None
        }
        Err(e) => {
            tracing::info!("Start game in {} refused: {}", channel, e);
            Some(e.into())
        }
    }
}

pub async fn handle_exit_game(state: &Arc<AppState>, channel: ChannelId) -> Option<ServerMessage> {
    tracing::info!("Exit game in {}", channel);
    match state.exit_game(&channel).await {
        Ok(_) => None,
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_get_status(state: &Arc<AppState>, channel: ChannelId) -> Option<ServerMessage> {
    match state.game_status(&channel).await {
        Ok(snapshot) => Some(ServerMessage::Status { channel, snapshot }),
        Err(e) => Some(e.into()),
    }
}
