use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::AppError;
use crate::game_loop::{GameCommand, GameStats};
use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: ConnectionInfo,
    pub game: GameStats,
}

#[derive(Serialize)]
pub struct ConnectionInfo {
    pub websocket: usize,
}

/// Server status, connection count, and a snapshot of the game as JSON.
///
/// Answers 503 once the game loop has stopped.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let ws = state.ws_connection_count.load(Ordering::Relaxed);

    let (reply, rx) = oneshot::channel();
    let unavailable = || AppError::ServiceUnavailable("game loop is not running".to_string());
    state
        .game_tx
        .send(GameCommand::Stats { reply })
        .await
        .map_err(|_| unavailable())?;
    let game = rx.await.map_err(|_| unavailable())?;

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connections: ConnectionInfo { websocket: ws },
        game,
    }))
}
