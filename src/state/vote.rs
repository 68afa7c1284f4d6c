use crate::error::{GameError, GameResult};
use crate::game::VoteStatus;
use crate::state::AppState;

impl AppState {
    /// Record a crowd vote for the human side's next move.
    ///
    /// Votes are refused once the game is over or while the automated side
    /// is to move.
    pub async fn cast_vote(
        &self,
        channel: &str,
        participant: &str,
        mv: &str,
    ) -> GameResult<VoteStatus> {
        let game = self.store.retrieve(channel).await?;
        let mut state = game.lock().await;

        if state.outcome().is_over() {
            return Err(GameError::GameOver);
        }
        if state.is_automated_turn() {
            return Err(GameError::NotVotingTurn);
        }

        state.cast_vote(participant, mv)
    }
}
