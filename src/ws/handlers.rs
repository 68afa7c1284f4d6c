//! WebSocket message dispatch
//!
//! Every client speaks the same protocol; handlers live in `host` (game
//! lifecycle) and `audience` (voting).

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

use super::{audience, host};

/// Handle client messages and return optional response
pub async fn handle_message(msg: ClientMessage, state: &Arc<AppState>) -> Option<ServerMessage> {
    match msg {
        ClientMessage::StartGame {
            channel,
            participant,
            side,
        } => host::handle_start_game(state, channel, participant, side).await,

        ClientMessage::ExitGame { channel } => host::handle_exit_game(state, channel).await,

        ClientMessage::GetStatus { channel } => host::handle_get_status(state, channel).await,

        ClientMessage::Vote {
            channel,
            participant,
            mv,
        } => audience::handle_vote(state, channel, participant, mv).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::state::tests::test_state;
    use crate::types::Side;

    #[tokio::test]
    async fn test_vote_without_game() {
        let state = Arc::new(test_state(&ManualClock::default()));

        let result = handle_message(
            ClientMessage::Vote {
                channel: "general".to_string(),
                participant: "bob".to_string(),
                mv: "e4".to_string(),
            },
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "NO_ACTIVE_GAME"),
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_then_status() {
        let state = Arc::new(test_state(&ManualClock::default()));

        let mut rx = state.broadcast.subscribe();

        let started = handle_message(
            ClientMessage::StartGame {
                channel: "general".to_string(),
                participant: "alice".to_string(),
                side: Some(Side::White),
            },
            &state,
        )
        .await;
        assert!(started.is_none());
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMessage::GameStarted {
                human_side: Side::White,
                ..
            })
        ));

        let status = handle_message(
            ClientMessage::GetStatus {
                channel: "general".to_string(),
            },
            &state,
        )
        .await;
        match status {
            Some(ServerMessage::Status { snapshot, .. }) => {
                assert_eq!(snapshot.white, "alice");
                assert_eq!(snapshot.turn, Side::White);
            }
            other => panic!("Expected status, got {:?}", other),
        }
    }
}
