use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crowdchess::{
    api,
    engine::{EngineConfig, MoveGenerator, RandomMover},
    state::AppState,
    types::GameConfig,
    ws,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crowdchess=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting crowdchess...");

    let config = GameConfig::from_env();

    // Initialize the automated side
    let engine_config = EngineConfig::from_env();
    let engine: Arc<dyn MoveGenerator> = match engine_config.build().await {
        Ok(engine) => {
            tracing::info!("Move generator initialized: {}", engine.name());
            engine
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize {:?} engine: {}. Falling back to random moves.",
                engine_config.kind,
                e
            );
            Arc::new(RandomMover::new())
        }
    };

    let state = Arc::new(AppState::new(config, engine));

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid BIND_ADDR '{}': {}", bind, e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
