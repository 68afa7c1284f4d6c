use chess::{Board, ChessMove};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use super::{GameState, ResolvedVote, VoteCount, VoteStatus};
use crate::error::GameResult;
use crate::types::*;

/// A [`GameState`] behind its lock.
///
/// Every mutation takes the lock for its whole duration. The id is copied out
/// so it can be read without locking.
#[derive(Debug)]
pub struct SharedGame {
    id: GameId,
    state: Mutex<GameState>,
}

/// Point-in-time view of a game for status replies and the move generator
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub fen: String,
    pub turn: Side,
    pub turn_participant: ParticipantId,
    pub automated_turn: bool,
    pub white: ParticipantId,
    pub black: ParticipantId,
    pub started: bool,
    pub outcome: Outcome,
    pub ply: usize,
    pub last_move: Option<String>,
    pub last_move_time: DateTime<Utc>,
    pub first_vote_time: Option<DateTime<Utc>>,
    pub ballots: usize,
    pub tally: Vec<VoteCount>,
    #[serde(skip)]
    pub board: Board,
}

impl SharedGame {
    pub fn new(state: GameState) -> Self {
        Self {
            id: state.id.clone(),
            state: Mutex::new(state),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Exclusive access for multi-step operations
    pub async fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().await
    }

    pub async fn cast_vote(&self, participant: &str, text: &str) -> GameResult<VoteStatus> {
        self.state.lock().await.cast_vote(participant, text)
    }

    pub async fn resolve_top_vote(&self) -> GameResult<ResolvedVote> {
        self.state.lock().await.resolve_top_vote()
    }

    pub async fn apply_external_move(&self, mv: ChessMove) -> GameResult<()> {
        self.state.lock().await.apply_external_move(mv)
    }

    pub async fn outcome(&self) -> Outcome {
        self.state.lock().await.outcome()
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.state.lock().await.snapshot()
    }
}

impl GameState {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_id: self.id.clone(),
            fen: self.fen(),
            turn: self.turn(),
            turn_participant: self.turn_participant().id.clone(),
            automated_turn: self.is_automated_turn(),
            white: self.white.id.clone(),
            black: self.black.id.clone(),
            started: self.started,
            outcome: self.outcome(),
            ply: self.position.ply(),
            last_move: self.last_move().map(|mv| mv.to_string()),
            last_move_time: self.last_move_time,
            first_vote_time: self.first_vote_time,
            ballots: self.ballots.len(),
            tally: self.tally(),
            board: self.position.board(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::game::tests::new_game;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_votes_are_not_lost() {
        let game = Arc::new(SharedGame::new(new_game(&ManualClock::default())));
        let moves = ["e4", "d4", "Nf3", "c4"];

        let mut tasks = Vec::new();
        for i in 0..64 {
            let game = game.clone();
            let mv = moves[i % moves.len()];
            tasks.push(tokio::spawn(async move {
                game.cast_vote(&format!("voter-{}", i), mv).await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), VoteStatus::Recorded);
        }

        let snapshot = game.snapshot().await;
        assert_eq!(snapshot.ballots, 64);
        assert_eq!(snapshot.tally.iter().map(|c| c.count).sum::<usize>(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_votes_racing_resolution_land_in_one_round() {
        let game = Arc::new(SharedGame::new(new_game(&ManualClock::default())));

        let mut tasks = Vec::new();
        for i in 0..32 {
            let game = game.clone();
            tasks.push(tokio::spawn(async move {
                game.cast_vote(&format!("voter-{}", i), "e4").await
            }));
        }
        let resolver = {
            let game = game.clone();
            tokio::spawn(async move { game.resolve_top_vote().await })
        };

        let mut recorded = 0;
        let mut rejected = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(VoteStatus::Recorded) => recorded += 1,
                Ok(VoteStatus::Duplicate) => unreachable!("every voter is distinct"),
                // e4 is not a legal reply for black once the round has been resolved
                Err(_) => rejected += 1,
            }
        }

        let snapshot = game.snapshot().await;
        match resolver.await.unwrap() {
            Ok(resolved) => {
                assert_eq!(resolved.total_ballots + snapshot.ballots, recorded);
                assert_eq!(snapshot.ballots, 0);
                assert_eq!(resolved.total_ballots + rejected, 32);
            }
            Err(e) => {
                assert_eq!(e, crate::error::GameError::NoTopVote);
                assert_eq!(snapshot.ballots, 32);
            }
        }
    }

    #[tokio::test]
    async fn test_snapshot_reflects_state() {
        let clock = ManualClock::default();
        let mut state = new_game(&clock);
        state.set_automated("chessbot").unwrap();
        let game = SharedGame::new(state);

        game.cast_vote("bob", "e4").await.unwrap();
        let before = game.snapshot().await;
        assert_eq!(before.game_id, "game-1");
        assert_eq!(before.turn, Side::White);
        assert_eq!(before.turn_participant, "alice");
        assert!(!before.automated_turn);
        assert_eq!(before.ballots, 1);
        assert_eq!(before.tally[0].notation, "e2e4");

        game.resolve_top_vote().await.unwrap();
        let after = game.snapshot().await;
        assert_eq!(after.turn, Side::Black);
        assert!(after.automated_turn);
        assert!(after.started);
        assert_eq!(after.last_move.as_deref(), Some("e2e4"));
        assert_eq!(after.ply, 1);
    }
}
