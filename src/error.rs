use crate::types::ParticipantId;

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur while creating or playing a game
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Move is not valid: {0}")]
    InvalidMove(String),

    #[error("Move cannot be played in this position: {0}")]
    IllegalMove(String),

    #[error("There was no top vote")]
    NoTopVote,

    #[error("There was a problem playing the move {0}")]
    MoveApplicationFailed(String),

    #[error("There is no game at the moment")]
    NoActiveGame,

    #[error("Participant {0} does not exist in this game")]
    ParticipantUnknown(ParticipantId),

    #[error("A game needs two participants, got {0}")]
    NotEnoughParticipants(usize),

    #[error("There is already a game in place")]
    GameInProgress,

    #[error("It is not the voting side's turn")]
    NotVotingTurn,

    #[error("The game is already over")]
    GameOver,
}

impl GameError {
    /// Stable code used in protocol error messages
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidMove(_) => "INVALID_MOVE",
            GameError::IllegalMove(_) => "ILLEGAL_MOVE",
            GameError::NoTopVote => "NO_TOP_VOTE",
            GameError::MoveApplicationFailed(_) => "MOVE_APPLICATION_FAILED",
            GameError::NoActiveGame => "NO_ACTIVE_GAME",
            GameError::ParticipantUnknown(_) => "PARTICIPANT_UNKNOWN",
            GameError::NotEnoughParticipants(_) => "NOT_ENOUGH_PARTICIPANTS",
            GameError::GameInProgress => "GAME_IN_PROGRESS",
            GameError::NotVotingTurn => "NOT_VOTING_TURN",
            GameError::GameOver => "GAME_OVER",
        }
    }
}
