//! The authoritative state of one crowd-vs-engine game.
//!
//! [`GameState`] does no locking of its own. Concurrent access goes through
//! [`SharedGame`], which owns the only lock.

mod moves;
mod result;
mod shared;
mod vote;

pub use shared::{GameSnapshot, SharedGame};
pub use vote::{Ballot, ResolvedVote, VoteCount, VoteStatus};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{GameError, GameResult};
use crate::rules::Position;
use crate::types::*;

pub struct GameState {
    id: GameId,
    position: Position,
    started: bool,
    white: Participant,
    black: Participant,
    /// Side whose moves come from the move generator instead of votes
    automated: Option<Side>,
    ballots: HashMap<ParticipantId, Ballot>,
    next_ballot_seq: u64,
    first_vote_time: Option<DateTime<Utc>>,
    /// Everyone who voted in a round that produced a move, in first-vote order
    voters_of_record: Vec<ParticipantId>,
    last_move_time: DateTime<Utc>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("id", &self.id)
            .field("fen", &self.position.fen())
            .field("white", &self.white)
            .field("black", &self.black)
            .field("ballots", &self.ballots.len())
            .finish()
    }
}

impl GameState {
    /// Create a game in the starting position.
    ///
    /// Only the first two participants are seated; they must be distinct.
    pub fn new(
        id: GameId,
        assignment: SideAssignment,
        participants: Vec<ParticipantId>,
        clock: Arc<dyn Clock>,
    ) -> GameResult<Self> {
        let (first, second) = match participants.as_slice() {
            [first, second, ..] if first == second => {
                return Err(GameError::NotEnoughParticipants(1))
            }
            [first, second, ..] => (first.clone(), second.clone()),
            other => return Err(GameError::NotEnoughParticipants(other.len())),
        };

        let (white, black) = match assignment {
            SideAssignment::Random => {
                if rand::random::<bool>() {
                    (first, second)
                } else {
                    (second, first)
                }
            }
            SideAssignment::Requested { participant, side } => {
                let other = if participant == first {
                    second
                } else if participant == second {
                    first
                } else {
                    return Err(GameError::ParticipantUnknown(participant));
                };
                match side {
                    Side::White => (participant, other),
                    Side::Black => (other, participant),
                }
            }
        };

        let now = clock.now();
        Ok(Self {
            id,
            position: Position::new(),
            started: false,
            white: Participant {
                id: white,
                side: Side::White,
            },
            black: Participant {
                id: black,
                side: Side::Black,
            },
            automated: None,
            ballots: HashMap::new(),
            next_ballot_seq: 0,
            first_vote_time: None,
            voters_of_record: Vec::new(),
            last_move_time: now,
            clock,
        })
    }

    /// Hand one participant's side over to the move generator
    pub fn set_automated(&mut self, participant: &str) -> GameResult<Side> {
        let side = self.side_of(participant)?;
        self.automated = Some(side);
        Ok(side)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Side to move, read from the board itself
    pub fn turn(&self) -> Side {
        self.position.turn()
    }

    pub fn turn_participant(&self) -> &Participant {
        self.participant(self.turn())
    }

    pub fn participant(&self, side: Side) -> &Participant {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    pub fn side_of(&self, participant: &str) -> GameResult<Side> {
        [&self.white, &self.black]
            .into_iter()
            .find(|p| p.id == participant)
            .map(|p| p.side)
            .ok_or_else(|| GameError::ParticipantUnknown(participant.to_string()))
    }

    pub fn automated_side(&self) -> Option<Side> {
        self.automated
    }

    pub fn is_automated_turn(&self) -> bool {
        self.automated == Some(self.turn())
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn fen(&self) -> String {
        self.position.fen()
    }

    pub fn last_move_time(&self) -> DateTime<Utc> {
        self.last_move_time
    }

    pub fn first_vote_time(&self) -> Option<DateTime<Utc>> {
        self.first_vote_time
    }

    pub fn ballot_count(&self) -> usize {
        self.ballots.len()
    }

    pub fn ballot(&self, participant: &str) -> Option<&Ballot> {
        self.ballots.get(participant)
    }

    pub fn voters_of_record(&self) -> &[ParticipantId] {
        &self.voters_of_record
    }
}
