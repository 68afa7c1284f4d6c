use crate::error::GameError;
use crate::game::{GameSnapshot, ResolvedVote};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    StartGame {
        channel: ChannelId,
        participant: ParticipantId,
        /// Side the human wants; random when omitted
        #[serde(default)]
        side: Option<Side>,
    },
    Vote {
        channel: ChannelId,
        participant: ParticipantId,
        /// Move in SAN ("Nf3") or coordinate notation ("g1f3")
        mv: String,
    },
    ExitGame {
        channel: ChannelId,
    },
    GetStatus {
        channel: ChannelId,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        server_now: String,
    },
    GameStarted {
        channel: ChannelId,
        game_id: GameId,
        human: ParticipantId,
        human_side: Side,
        fen: String,
    },
    VoteAccepted {
        channel: ChannelId,
        participant: ParticipantId,
        mv: String,
        /// False when the participant had already voted this round
        recorded: bool,
    },
    MoveResolved {
        channel: ChannelId,
        vote: ResolvedVote,
        fen: String,
    },
    AutomatedMoved {
        channel: ChannelId,
        mv: String,
        fen: String,
    },
    GameConcluded {
        channel: ChannelId,
        game_id: GameId,
        outcome: Outcome,
        result: String,
    },
    GameAbandoned {
        channel: ChannelId,
        game_id: GameId,
    },
    GameExited {
        channel: ChannelId,
        game_id: GameId,
    },
    Status {
        channel: ChannelId,
        snapshot: GameSnapshot,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl From<&GameError> for ServerMessage {
    fn from(err: &GameError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

impl From<GameError> for ServerMessage {
    fn from(err: GameError) -> Self {
        ServerMessage::from(&err)
    }
}
