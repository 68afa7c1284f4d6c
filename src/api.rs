//! HTTP API endpoints for reading game state.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::GameError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct LegalMovesResponse {
    pub channel: String,
    pub moves: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    code: &'static str,
    msg: String,
}

fn error_response(err: GameError) -> Response {
    let status = match err {
        GameError::NoActiveGame => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorBody {
            code: err.code(),
            msg: err.to_string(),
        }),
    )
        .into_response()
}

/// Routes under `/api`, merged into the main router
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/games/{channel}", get(game_status))
        .route("/api/games/{channel}/moves", get(legal_moves))
}

/// Status snapshot of the channel's game.
///
/// GET /api/games/{channel}
pub async fn game_status(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Response {
    match state.game_status(&channel).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => error_response(e),
    }
}

/// Legal moves for the side to move.
///
/// GET /api/games/{channel}/moves
pub async fn legal_moves(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Response {
    match state.legal_moves(&channel).await {
        Ok(moves) => Json(LegalMovesResponse { channel, moves }).into_response(),
        Err(e) => error_response(e),
    }
}
