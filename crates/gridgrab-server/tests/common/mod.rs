use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use gridgrab_core::net::messages::{ClientMessage, ServerMessage, SetPlayerInfoMsg};
use gridgrab_core::net::protocol::{decode_server_message, encode_client_message};
use gridgrab_core::player::PlayerId;

use gridgrab_server::build_app;
use gridgrab_server::config::ServerConfig;
use gridgrab_server::state::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub shutdown: CancellationToken,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    /// Short rounds and a fast tick, for tests that play a whole round.
    pub async fn with_short_rounds() -> Self {
        let mut config = ServerConfig::default();
        config.game.rules.min_round_secs = 1;
        config.game.rules.default_round_secs = 1;
        config.game.tick_ms = 10;
        Self::from_config(config).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = CancellationToken::new();
        let (app, state, _game_loop) = build_app(config, shutdown.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            shutdown,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Connect and consume the welcome message. Returns the assigned player id.
pub async fn ws_join(url: &str) -> (WsStream, PlayerId) {
    let mut stream = ws_connect(url).await;
    match ws_read_server_msg(&mut stream).await {
        ServerMessage::Welcome(w) => (stream, w.player_id),
        other => panic!("Expected Welcome, got: {other:?}"),
    }
}

/// Read the next text frame (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> String {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(data))) => return data.as_str().to_owned(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read a text frame, returning None on timeout.
pub async fn ws_try_read_raw(stream: &mut WsStream, timeout_ms: u64) -> Option<String> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(data))) => return data.as_str().to_owned(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Read the next ServerMessage (5s timeout).
pub async fn ws_read_server_msg(stream: &mut WsStream) -> ServerMessage {
    let data = ws_read_raw(stream).await;
    decode_server_message(&data).unwrap()
}

/// Skip messages until one satisfies `pred` (5s timeout per message).
pub async fn ws_expect(
    stream: &mut WsStream,
    pred: impl Fn(&ServerMessage) -> bool,
) -> ServerMessage {
    loop {
        let msg = ws_read_server_msg(stream).await;
        if pred(&msg) {
            return msg;
        }
    }
}

pub async fn ws_send_client_msg(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Text(encoded.into())).await.unwrap();
}

pub async fn ws_send_text(stream: &mut WsStream, text: &str) {
    stream.send(Message::Text(text.to_owned().into())).await.unwrap();
}

/// Register a name and color. Returns the acknowledgement.
pub async fn ws_set_info(stream: &mut WsStream, name: &str, color: &str) -> ServerMessage {
    let msg = ClientMessage::SetPlayerInfo(SetPlayerInfoMsg {
        name: name.to_string(),
        color: color.to_string(),
    });
    ws_send_client_msg(stream, &msg).await;
    ws_expect(stream, |m| matches!(m, ServerMessage::PlayerInfoAck(_))).await
}

/// Name the player and ready up.
pub async fn ws_name_and_ready(stream: &mut WsStream, name: &str, color: &str) {
    match ws_set_info(stream, name, color).await {
        ServerMessage::PlayerInfoAck(ack) => assert!(ack.success, "{ack:?}"),
        other => panic!("Expected PlayerInfoAck, got: {other:?}"),
    }
    ws_send_client_msg(stream, &ClientMessage::SetReady).await;
}

/// Wait for a lobby snapshot with `n` players, all of them ready.
pub async fn ws_wait_all_ready(stream: &mut WsStream, n: usize) {
    ws_expect(stream, |m| match m {
        ServerMessage::UpdateLobby(lobby) => {
            lobby.players.len() == n && lobby.players.iter().all(|p| p.ready)
        },
        _ => false,
    })
    .await;
}
