pub mod config;
pub mod connections;
pub mod error;
pub mod game_loop;
pub mod health;
pub mod rate_limit;
pub mod state;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use config::ServerConfig;
use state::AppState;

/// Build the router, spawn the game loop, and return both with the shared state.
///
/// The loop stops when `shutdown` is cancelled or a `Shutdown` command arrives.
pub fn build_app(
    config: ServerConfig,
    shutdown: CancellationToken,
) -> (Router<()>, AppState, JoinHandle<()>) {
    let web_root = config.web_root.clone();
    let (game_tx, game_loop) = game_loop::spawn_game_loop(
        config.game.rules.clone(),
        Duration::from_millis(config.game.tick_ms),
        shutdown,
    );
    let state = AppState::new(config, game_tx);

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .fallback_service(ServeDir::new(&web_root))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state, game_loop)
}
