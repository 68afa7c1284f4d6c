mod game;
mod vote;

use crate::clock::{Clock, SystemClock};
use crate::engine::MoveGenerator;
use crate::protocol::ServerMessage;
use crate::store::GameStore;
use crate::types::GameConfig;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: GameStore,
    pub config: GameConfig,
    /// Plays the automated side of every game
    pub engine: Arc<dyn MoveGenerator>,
    pub clock: Arc<dyn Clock>,
    /// Broadcast channel for game events, every connection subscribes
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(config: GameConfig, engine: Arc<dyn MoveGenerator>) -> Self {
        Self::with_clock(config, engine, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: GameConfig,
        engine: Arc<dyn MoveGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            store: GameStore::new(),
            config,
            engine,
            clock,
            broadcast: tx,
        }
    }

    /// Send an event to every connected client
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        // Ignore send errors (no receivers connected is fine)
        let _ = self.broadcast.send(msg);
    }
}
