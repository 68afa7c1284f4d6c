use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque ID types for type safety
pub type GameId = String;
pub type ChannelId = String;
pub type ParticipantId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

impl From<chess::Color> for Side {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Side::White,
            chess::Color::Black => Side::Black,
        }
    }
}

impl From<Side> for chess::Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => chess::Color::White,
            Side::Black => chess::Color::Black,
        }
    }
}

/// A participant and the side they hold for the lifetime of a game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub side: Side,
}

/// How the two participants are mapped onto the two sides
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideAssignment {
    Random,
    /// The named participant plays `side`; the other one gets the opposite
    Requested { participant: ParticipantId, side: Side },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawMethod {
    Stalemate,
    InsufficientMaterial,
    FivefoldRepetition,
    SeventyFiveMoveRule,
}

impl fmt::Display for DrawMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DrawMethod::Stalemate => "stalemate",
            DrawMethod::InsufficientMaterial => "insufficient material",
            DrawMethod::FivefoldRepetition => "fivefold repetition",
            DrawMethod::SeventyFiveMoveRule => "the seventy-five move rule",
        };
        f.write_str(text)
    }
}

/// Terminal state of the board as reported by the rules engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    NoOutcome,
    Decisive { winner: Side },
    Draw { method: DrawMethod },
}

impl Outcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, Outcome::NoOutcome)
    }

    /// Score in PGN notation ("1-0", "0-1", "1/2-1/2", "*")
    pub fn score(&self) -> &'static str {
        match self {
            Outcome::NoOutcome => "*",
            Outcome::Decisive { winner: Side::White } => "1-0",
            Outcome::Decisive { winner: Side::Black } => "0-1",
            Outcome::Draw { .. } => "1/2-1/2",
        }
    }
}

/// Timing and identity settings consumed by the game core and its loop
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Human side idle time after which the game is dropped
    pub abandon_after: Duration,
    /// Human side idle time after which the leading vote is played
    pub resolve_after: Duration,
    pub poll_interval: Duration,
    /// Simulated pause before the automated side moves
    pub thinking_delay: Duration,
    /// Search budget handed to the move generator
    pub search_time: Duration,
    /// Participant id of the automated side
    pub bot_id: ParticipantId,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            abandon_after: Duration::from_secs(30),
            resolve_after: Duration::from_secs(20),
            poll_interval: Duration::from_secs(1),
            thinking_delay: Duration::from_secs(2),
            search_time: Duration::from_millis(10),
            bot_id: "chessbot".to_string(),
        }
    }
}

impl GameConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let abandon_after = std::env::var("GAME_ABANDON_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.abandon_after);

        let resolve_after = std::env::var("GAME_RESOLVE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.resolve_after);

        let poll_interval = std::env::var("GAME_POLL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let thinking_delay = std::env::var("GAME_THINKING_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.thinking_delay);

        let search_time = std::env::var("GAME_SEARCH_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.search_time);

        let bot_id = std::env::var("BOT_ID")
            .ok()
            .and_then(|id| {
                let trimmed = id.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or(defaults.bot_id);

        if resolve_after >= abandon_after {
            tracing::warn!(
                "GAME_RESOLVE_SECS ({:?}) is not below GAME_ABANDON_SECS ({:?}); votes will never be resolved",
                resolve_after,
                abandon_after
            );
        }

        Self {
            abandon_after,
            resolve_after,
            poll_interval,
            thinking_delay,
            search_time,
            bot_id,
        }
    }
}
