use chess::ChessMove;

use super::GameState;
use crate::error::{GameError, GameResult};
use crate::types::Outcome;

impl GameState {
    /// Play a move given in algebraic notation
    pub fn apply_move(&mut self, text: &str) -> GameResult<ChessMove> {
        let mv = self
            .position
            .parse_move(text)
            .map_err(|_| GameError::IllegalMove(text.to_string()))?;
        self.commit(mv)?;
        Ok(mv)
    }

    /// Play a move produced outside the voting path (the move generator)
    pub fn apply_external_move(&mut self, mv: ChessMove) -> GameResult<()> {
        self.commit(mv)
    }

    pub fn outcome(&self) -> Outcome {
        self.position.outcome()
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.position.last_move()
    }

    pub fn legal_moves(&self) -> Vec<ChessMove> {
        self.position.legal_moves()
    }

    /// Apply a move and close the round. Nothing changes on failure.
    pub(super) fn commit(&mut self, mv: ChessMove) -> GameResult<()> {
        self.position.apply(mv)?;

        self.started = true;
        let now = self.clock.now();
        if now > self.last_move_time {
            self.last_move_time = now;
        }

        self.ballots.clear();
        self.first_vote_time = None;
        Ok(())
    }
}
