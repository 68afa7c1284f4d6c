mod random;
mod uci;

use async_trait::async_trait;
use chess::{Board, ChessMove};
use std::sync::Arc;
use std::time::Duration;

pub use random::RandomMover;
pub use uci::UciEngine;

/// Result type for move generation
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while asking the automated side for a move
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to start engine: {0}")]
    Spawn(String),

    #[error("Engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine protocol error: {0}")]
    Protocol(String),

    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Engine found no move")]
    NoMove,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Position handed to a move generator
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub board: Board,
    /// FEN including move counters, for engines that speak text
    pub fen: String,
    /// How long the generator may search
    pub budget: Duration,
}

/// Trait that all move generators must implement
#[async_trait]
pub trait MoveGenerator: Send + Sync {
    /// Pick one legal move for the side to move
    async fn best_move(&self, request: MoveRequest) -> EngineResult<ChessMove>;

    /// Get the name of this generator
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// External UCI binary such as stockfish
    Uci,
    Random,
}

/// Configuration for the automated side
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub kind: EngineKind,
    /// Path or command name of the UCI binary
    pub path: String,
    /// Extra time allowed on top of the search budget before giving up
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Uci,
            path: "stockfish".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let kind = match std::env::var("ENGINE_KIND")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Ok("random") => EngineKind::Random,
            Ok("uci") | Err(_) => EngineKind::Uci,
            Ok(other) => {
                tracing::warn!("Unknown ENGINE_KIND '{}', using uci", other);
                EngineKind::Uci
            }
        };

        let path = std::env::var("ENGINE_PATH")
            .ok()
            .and_then(|path| {
                let trimmed = path.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| "stockfish".to_string());

        Self {
            kind,
            path,
            timeout: std::env::var("ENGINE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(10)),
        }
    }

    /// Start the configured move generator
    pub async fn build(&self) -> EngineResult<Arc<dyn MoveGenerator>> {
        match self.kind {
            EngineKind::Random => Ok(Arc::new(RandomMover::new())),
            EngineKind::Uci => {
                if self.path.is_empty() {
                    return Err(EngineError::Config(
                        "ENGINE_PATH must name a UCI binary".to_string(),
                    ));
                }
                let engine = UciEngine::spawn(&self.path, self.timeout).await?;
                Ok(Arc::new(engine))
            }
        }
    }
}
