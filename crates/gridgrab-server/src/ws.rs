use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};

use gridgrab_core::net::protocol::decode_client_message;
use gridgrab_core::player::PlayerId;

use crate::error::AppError;
use crate::game_loop::GameCommand;
use crate::rate_limit::RateLimiter;
use crate::state::{AppState, ConnectionGuard};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(AppError::ServiceUnavailable(
            "connection limit reached".to_string(),
        ));
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state))
        .into_response())
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let (ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<Utf8Bytes>(state.config.limits.player_message_buffer);
    let (reply, id_rx) = oneshot::channel();
    if state
        .game_tx
        .send(GameCommand::Connect { sender: tx, reply })
        .await
        .is_err()
    {
        tracing::warn!("Game loop unavailable, dropping connection");
        return;
    }
    let Ok(player_id) = id_rx.await else {
        return;
    };

    spawn_writer(ws_sender, rx);

    read_loop(&mut ws_receiver, &state, player_id).await;

    if state
        .game_tx
        .send(GameCommand::Disconnect { player_id })
        .await
        .is_err()
    {
        tracing::debug!(player_id, "Game loop gone before disconnect");
    }
}

/// Drain the connection's queue into the socket. A closed queue means the
/// server dropped this connection, so the socket is closed too.
fn spawn_writer(mut ws_sender: SplitSink<WebSocket, Message>, mut rx: mpsc::Receiver<Utf8Bytes>) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if ws_sender.send(Message::Text(data)).await.is_err() {
                return;
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });
}

async fn read_loop(
    ws_receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
    player_id: PlayerId,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(player_id, "Rate limited");
            continue;
        }

        let message = match decode_client_message(text.as_str()) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(player_id, error = %e, "Dropping undecodable frame");
                continue;
            },
        };

        if state
            .game_tx
            .send(GameCommand::Client { player_id, message })
            .await
            .is_err()
        {
            break;
        }
    }
}
