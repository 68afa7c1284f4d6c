// Public API for integration tests and potential library usage

pub mod api;
pub mod clock;
pub mod engine;
pub mod error;
pub mod game;
pub mod protocol;
pub mod rules;
pub mod state;
pub mod store;
pub mod types;
pub mod ws;

// Re-export the game loop for testing
pub mod game_loop;
