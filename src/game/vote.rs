use chess::ChessMove;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::GameState;
use crate::error::{GameError, GameResult};
use crate::types::ParticipantId;

/// One participant's move for the current round
#[derive(Debug, Clone)]
pub struct Ballot {
    pub participant: ParticipantId,
    /// Move as the participant typed it
    pub text: String,
    pub mv: ChessMove,
    pub cast_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteStatus {
    Recorded,
    /// The participant already voted this round; the earlier ballot stands
    Duplicate,
}

/// Ballots for one move, grouped
#[derive(Debug, Clone, Serialize)]
pub struct VoteCount {
    /// Coordinate notation, e.g. "e2e4"
    pub notation: String,
    /// Text of the earliest ballot for this move
    pub text: String,
    pub count: usize,
    #[serde(skip)]
    pub mv: ChessMove,
    #[serde(skip)]
    first_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVote {
    pub notation: String,
    pub text: String,
    pub votes: usize,
    pub total_ballots: usize,
}

impl GameState {
    /// Record a participant's move for this round.
    ///
    /// Does not check whose turn it is; callers enforce that.
    pub fn cast_vote(&mut self, participant: &str, text: &str) -> GameResult<VoteStatus> {
        let mv = self.position.parse_move(text)?;

        if self.ballots.contains_key(participant) {
            tracing::debug!("{} already voted this round, ignoring {}", participant, text);
            return Ok(VoteStatus::Duplicate);
        }

        let now = self.clock.now();
        if self.ballots.is_empty() {
            self.first_vote_time = Some(now);
        }

        tracing::debug!("{} is voting for {}", participant, text);
        self.ballots.insert(
            participant.to_string(),
            Ballot {
                participant: participant.to_string(),
                text: text.trim().to_string(),
                mv,
                cast_at: now,
                seq: self.next_ballot_seq,
            },
        );
        self.next_ballot_seq += 1;

        if !self.voters_of_record.iter().any(|v| v == participant) {
            self.voters_of_record.push(participant.to_string());
        }

        Ok(VoteStatus::Recorded)
    }

    /// Current round's counts, best first.
    ///
    /// Equal counts are ordered by whichever move received its first ballot earlier.
    pub fn tally(&self) -> Vec<VoteCount> {
        let mut counts: HashMap<ChessMove, VoteCount> = HashMap::new();

        for ballot in self.ballots.values() {
            let entry = counts.entry(ballot.mv).or_insert_with(|| VoteCount {
                notation: ballot.mv.to_string(),
                text: ballot.text.clone(),
                count: 0,
                mv: ballot.mv,
                first_seq: ballot.seq,
            });
            entry.count += 1;
            if ballot.seq < entry.first_seq {
                entry.first_seq = ballot.seq;
                entry.text = ballot.text.clone();
            }
        }

        let mut tally: Vec<VoteCount> = counts.into_values().collect();
        tally.sort_by(|a, b| b.count.cmp(&a.count).then(a.first_seq.cmp(&b.first_seq)));
        tally
    }

    /// Play the leading move and start a new round
    pub fn resolve_top_vote(&mut self) -> GameResult<ResolvedVote> {
        let top = self
            .tally()
            .into_iter()
            .next()
            .ok_or(GameError::NoTopVote)?;

        let total_ballots = self.ballots.len();

        if let Err(e) = self.commit(top.mv) {
            tracing::error!("Top vote {} could not be played: {}", top.notation, e);
            return Err(GameError::MoveApplicationFailed(top.notation));
        }

        tracing::info!(
            "Game {}: played {} with {}/{} votes",
            self.id,
            top.notation,
            top.count,
            total_ballots
        );

        Ok(ResolvedVote {
            notation: top.notation,
            text: top.text,
            votes: top.count,
            total_ballots,
        })
    }
}
