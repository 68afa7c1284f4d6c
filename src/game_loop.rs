//! Background task driving one game: automated replies, vote resolution,
//! conclusion and abandonment.

use crate::clock::elapsed_since;
use crate::engine::MoveRequest;
use crate::error::GameError;
use crate::game::SharedGame;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{ChannelId, GameId};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What a single tick decided about the loop's future
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Continue,
    /// The game reached an outcome and was removed
    Concluded,
    /// Nobody moved for too long and the game was removed
    Abandoned,
    /// The channel no longer holds this game
    Vacant,
}

/// Spawn the polling task for a freshly started game
pub fn spawn_game_loop(
    state: Arc<AppState>,
    channel: ChannelId,
    game_id: GameId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = state.config.poll_interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!("Game loop for {} in {} started", game_id, channel);

        loop {
            interval.tick().await;

            let status = tick(&state, &channel, &game_id).await;
            if status != LoopStatus::Continue {
                tracing::info!(
                    "Game loop for {} in {} stopped: {:?}",
                    game_id,
                    channel,
                    status
                );
                break;
            }
        }
    })
}

/// Run one polling step for `game_id` in `channel`
pub async fn tick(state: &AppState, channel: &str, game_id: &str) -> LoopStatus {
    let game = match state.store.retrieve(channel).await {
        Ok(game) if game.id() == game_id => game,
        _ => return LoopStatus::Vacant,
    };

    let (outcome, result, automated_turn, idle) = {
        let locked = game.lock().await;
        (
            locked.outcome(),
            locked.result_text(),
            locked.is_automated_turn(),
            elapsed_since(state.clock.as_ref(), locked.last_move_time()),
        )
    };

    if outcome.is_over() {
        if state.store.remove_if_current(channel, game_id).await {
            let result = result.unwrap_or_else(|| format!("Game completed. {}", outcome.score()));
            tracing::info!("Game {} in {} concluded: {}", game_id, channel, result);
            state.broadcast_to_all(ServerMessage::GameConcluded {
                channel: channel.to_string(),
                game_id: game_id.to_string(),
                outcome,
                result,
            });
        }
        return LoopStatus::Concluded;
    }

    // Also covers an automated side whose generator keeps failing
    if idle > state.config.abandon_after {
        if state.store.remove_if_current(channel, game_id).await {
            tracing::info!(
                "Game {} in {} abandoned after {:?} without a move",
                game_id,
                channel,
                idle
            );
            state.broadcast_to_all(ServerMessage::GameAbandoned {
                channel: channel.to_string(),
                game_id: game_id.to_string(),
            });
        }
        return LoopStatus::Abandoned;
    }

    if automated_turn {
        play_automated_move(state, channel, &game).await;
        return LoopStatus::Continue;
    }

    if idle > state.config.resolve_after {
        resolve_votes(state, channel, &game).await;
    }

    LoopStatus::Continue
}

async fn resolve_votes(state: &AppState, channel: &str, game: &SharedGame) {
    let (resolved, fen) = {
        let mut locked = game.lock().await;
        match locked.resolve_top_vote() {
            Ok(resolved) => (resolved, locked.fen()),
            Err(GameError::NoTopVote) => return,
            Err(e) => {
                tracing::warn!("Game {}: vote resolution failed: {}", game.id(), e);
                return;
            }
        }
    };

    state.broadcast_to_all(ServerMessage::MoveResolved {
        channel: channel.to_string(),
        vote: resolved,
        fen,
    });
}

/// Ask the move generator for a reply and commit it if the board is unchanged.
///
/// The lock is held only for the snapshot and for the commit.
async fn play_automated_move(state: &AppState, channel: &str, game: &SharedGame) {
    if !state.config.thinking_delay.is_zero() {
        tokio::time::sleep(state.config.thinking_delay).await;
    }

    let snapshot = game.snapshot().await;
    if !snapshot.automated_turn || snapshot.outcome.is_over() {
        return;
    }

    let request = MoveRequest {
        board: snapshot.board,
        fen: snapshot.fen,
        budget: state.config.search_time,
    };

    let mv = match state.engine.best_move(request).await {
        Ok(mv) => mv,
        Err(e) => {
            tracing::warn!(
                "Game {}: {} produced no move: {}",
                game.id(),
                state.engine.name(),
                e
            );
            return;
        }
    };

    let (over, fen) = {
        let mut locked = game.lock().await;
        if locked.position().ply() != snapshot.ply
            || locked.position().board().get_hash() != snapshot.board.get_hash()
        {
            tracing::warn!(
                "Game {}: position changed while thinking, dropping {}",
                game.id(),
                mv
            );
            return;
        }
        if let Err(e) = locked.apply_external_move(mv) {
            tracing::warn!("Game {}: generated move rejected: {}", game.id(), e);
            return;
        }
        (locked.outcome().is_over(), locked.fen())
    };

    tracing::debug!("Game {}: automated side played {}", game.id(), mv);

    // A mating move is announced by the conclusion on the next tick
    if !over && state.store.is_current(channel, game.id()).await {
        state.broadcast_to_all(ServerMessage::AutomatedMoved {
            channel: channel.to_string(),
            mv: mv.to_string(),
            fen,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::engine::{EngineError, EngineResult, MoveGenerator};
    use crate::state::tests::test_state;
    use crate::types::{GameConfig, Side};
    use async_trait::async_trait;
    use chess::ChessMove;
    use std::str::FromStr;

    struct FailingMover;

    #[async_trait]
    impl MoveGenerator for FailingMover {
        async fn best_move(&self, _request: MoveRequest) -> EngineResult<ChessMove> {
            Err(EngineError::Timeout(Duration::from_millis(1)))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Always answers with the same move, legal or not
    struct FixedMover(&'static str);

    #[async_trait]
    impl MoveGenerator for FixedMover {
        async fn best_move(&self, _request: MoveRequest) -> EngineResult<ChessMove> {
            ChessMove::from_str(self.0).map_err(|_| EngineError::NoMove)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn state_with_engine(clock: &ManualClock, engine: Arc<dyn MoveGenerator>) -> AppState {
        let config = GameConfig {
            thinking_delay: Duration::ZERO,
            ..GameConfig::default()
        };
        AppState::with_clock(config, engine, Arc::new(clock.clone()))
    }

    #[tokio::test]
    async fn test_idle_game_with_no_votes_is_abandoned() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (game, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();
        let mut rx = state.broadcast.subscribe();

        clock.advance(Duration::from_secs(31));
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Abandoned);

        assert!(state.store.is_empty().await);
        assert_eq!(game.snapshot().await.ply, 0);
        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerMessage::GameAbandoned { .. }
        ));
    }

    #[tokio::test]
    async fn test_abandonment_wins_over_pending_votes() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (game, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();
        state.cast_vote("general", "bob", "e4").await.unwrap();

        clock.advance(Duration::from_secs(31));
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Abandoned);
        assert_eq!(game.snapshot().await.ply, 0);
    }

    #[tokio::test]
    async fn test_votes_wait_for_resolve_threshold() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (game, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();
        state.cast_vote("general", "bob", "e4").await.unwrap();

        clock.advance(Duration::from_secs(10));
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);

        let snapshot = game.snapshot().await;
        assert_eq!(snapshot.ballots, 1);
        assert_eq!(snapshot.ply, 0);
    }

    #[tokio::test]
    async fn test_top_vote_resolved_after_threshold() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (game, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();
        let mut rx = state.broadcast.subscribe();

        state.cast_vote("general", "bob", "d4").await.unwrap();
        state.cast_vote("general", "carol", "e4").await.unwrap();
        state.cast_vote("general", "dave", "e2e4").await.unwrap();

        clock.advance(Duration::from_secs(21));
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);

        let snapshot = game.snapshot().await;
        assert_eq!(snapshot.turn, Side::Black);
        assert_eq!(snapshot.last_move.as_deref(), Some("e2e4"));
        assert_eq!(snapshot.ballots, 0);

        match rx.recv().await.unwrap() {
            ServerMessage::MoveResolved { vote, .. } => {
                assert_eq!(vote.notation, "e2e4");
                assert_eq!(vote.votes, 2);
                assert_eq!(vote.total_ballots, 3);
            }
            other => panic!("unexpected broadcast: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_votes_past_resolve_threshold_keeps_polling() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (game, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(25));
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);
        assert!(state.store.is_current("general", game.id()).await);
        assert_eq!(game.snapshot().await.ply, 0);
    }

    #[tokio::test]
    async fn test_automated_side_moves() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (game, _) = state
            .start_game("general", "alice", Some(Side::Black))
            .await
            .unwrap();
        let mut rx = state.broadcast.subscribe();

        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);

        let snapshot = game.snapshot().await;
        assert_eq!(snapshot.ply, 1);
        assert_eq!(snapshot.turn, Side::Black);
        assert!(!snapshot.automated_turn);
        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerMessage::AutomatedMoved { .. }
        ));
    }

    #[tokio::test]
    async fn test_generator_failure_is_retried_later() {
        let clock = ManualClock::default();
        let state = state_with_engine(&clock, Arc::new(FailingMover));
        let (game, _) = state
            .start_game("general", "alice", Some(Side::Black))
            .await
            .unwrap();

        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);

        let snapshot = game.snapshot().await;
        assert_eq!(snapshot.ply, 0);
        assert!(snapshot.automated_turn);
    }

    #[tokio::test]
    async fn test_stalled_generator_frees_the_channel() {
        let clock = ManualClock::default();
        let state = state_with_engine(&clock, Arc::new(FailingMover));
        let (game, _) = state
            .start_game("general", "alice", Some(Side::Black))
            .await
            .unwrap();
        let mut rx = state.broadcast.subscribe();

        clock.advance(Duration::from_secs(29));
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);
        assert!(state.store.is_current("general", game.id()).await);

        clock.advance(Duration::from_secs(3600));
        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Abandoned);
        assert!(state.store.is_empty().await);
        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerMessage::GameAbandoned { .. }
        ));

        // the channel accepts a new game
        assert!(state.start_game("general", "bob", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_illegal_generated_move_is_dropped() {
        let clock = ManualClock::default();
        let state = state_with_engine(&clock, Arc::new(FixedMover("e2e5")));
        let (game, _) = state
            .start_game("general", "alice", Some(Side::Black))
            .await
            .unwrap();

        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Continue);
        assert_eq!(game.snapshot().await.ply, 0);
    }

    #[tokio::test]
    async fn test_concluded_game_is_announced_and_removed() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (game, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();
        {
            let mut locked = game.lock().await;
            for mv in ["f3", "e5", "g4", "Qh4#"] {
                locked.apply_move(mv).unwrap();
            }
        }
        let mut rx = state.broadcast.subscribe();

        assert_eq!(tick(&state, "general", game.id()).await, LoopStatus::Concluded);
        assert!(state.store.is_empty().await);

        match rx.recv().await.unwrap() {
            ServerMessage::GameConcluded { result, .. } => {
                assert!(result.starts_with("I won this time!"));
                assert!(result.contains("0-1"));
            }
            other => panic!("unexpected broadcast: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_loop_of_replaced_game_is_vacant() {
        let clock = ManualClock::default();
        let state = test_state(&clock);
        let (old, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();
        state.exit_game("general").await.unwrap();

        assert_eq!(tick(&state, "general", old.id()).await, LoopStatus::Vacant);

        let (new, _) = state
            .start_game("general", "bob", Some(Side::White))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(31));
        assert_eq!(tick(&state, "general", old.id()).await, LoopStatus::Vacant);
        assert!(state.store.is_current("general", new.id()).await);
    }

    #[tokio::test]
    async fn test_spawned_loop_stops_when_game_exits() {
        let clock = ManualClock::default();
        let state = Arc::new(test_state(&clock));
        let (game, _) = state
            .start_game("general", "alice", Some(Side::White))
            .await
            .unwrap();

        let handle = spawn_game_loop(state.clone(), "general".to_string(), game.id().to_string());
        state.exit_game("general").await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
