//! Audience message handlers

use crate::game::VoteStatus;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

pub async fn handle_vote(
    state: &Arc<AppState>,
    channel: ChannelId,
    participant: ParticipantId,
    mv: String,
) -> Option<ServerMessage> {
    tracing::debug!("Vote in {} from {}: {}", channel, participant, mv);

    match state.cast_vote(&channel, &participant, &mv).await {
        Ok(status) => {
            if status == VoteStatus::Duplicate {
                tracing::debug!("{} already voted this round, keeping first vote", participant);
            }
            Some(ServerMessage::VoteAccepted {
                channel,
                participant,
                mv,
                recorded: status == VoteStatus::Recorded,
            })
        }
        Err(e) => {
            tracing::debug!("Vote from {} rejected: {}", participant, e);
            Some(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn test_duplicate_vote_is_acknowledged_but_not_recorded() {
        let state = Arc::new(test_state(&ManualClock::default()));
        state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();

        let first = handle_vote(
            &state,
            "general".to_string(),
            "bob".to_string(),
            "e4".to_string(),
        )
        .await;
        assert!(matches!(
            first,
            Some(ServerMessage::VoteAccepted { recorded: true, .. })
        ));

        let second = handle_vote(
            &state,
            "general".to_string(),
            "bob".to_string(),
            "d4".to_string(),
        )
        .await;
        assert!(matches!(
            second,
            Some(ServerMessage::VoteAccepted { recorded: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_unparsable_vote() {
        let state = Arc::new(test_state(&ManualClock::default()));
        state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();

        let reply = handle_vote(
            &state,
            "general".to_string(),
            "bob".to_string(),
            "zz9".to_string(),
        )
        .await;
        match reply {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "INVALID_MOVE"),
            other => panic!("Expected error, got {:?}", other),
        }
        assert_eq!(state.game_status("general").await.unwrap().ballots, 0);
    }
}
