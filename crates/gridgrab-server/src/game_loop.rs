use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use gridgrab_core::gateway::Gateway;
use gridgrab_core::net::messages::{AlertMsg, ClientMessage, ServerMessage};
use gridgrab_core::net::outbox::{Audience, Outbound};
use gridgrab_core::player::PlayerId;
use gridgrab_core::rules::GameRules;
use gridgrab_core::time::now_millis;
use gridgrab_core::world::RoundStatus;

use crate::connections::ConnectionRegistry;

/// Alert sent to every connection before the server goes away.
pub const SHUTDOWN_NOTICE: &str = "Server is shutting down";

/// Command channel depth. Senders wait when the loop falls behind.
const COMMAND_BUFFER: usize = 1024;

/// Commands sent from connection handlers to the game loop.
#[derive(Debug)]
pub enum GameCommand {
    Connect {
        sender: mpsc::Sender<Utf8Bytes>,
        reply: oneshot::Sender<PlayerId>,
    },
    Client {
        player_id: PlayerId,
        message: ClientMessage,
    },
    Disconnect {
        player_id: PlayerId,
    },
    Stats {
        reply: oneshot::Sender<GameStats>,
    },
    Shutdown,
}

/// Snapshot of the game for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub players: usize,
    pub participants: usize,
    pub status: RoundStatus,
}

/// Spawn the game loop as a tokio task. It owns the gateway and every
/// connection's outbound queue; nothing else touches game state.
pub fn spawn_game_loop(
    rules: GameRules,
    tick: Duration,
    shutdown: CancellationToken,
) -> (mpsc::Sender<GameCommand>, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let gateway = Gateway::new(rules, StdRng::from_os_rng());
    let handle = tokio::spawn(run_game_loop(gateway, tick, cmd_rx, shutdown));
    (cmd_tx, handle)
}

async fn run_game_loop(
    mut gateway: Gateway,
    tick: Duration,
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    shutdown: CancellationToken,
) {
    let mut connections = ConnectionRegistry::new();
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(tick_ms = tick.as_millis() as u64, "Game loop started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                if !handle_command(&mut gateway, &mut connections, cmd) {
                    break;
                }
            },
            _ = interval.tick() => {
                let out = gateway.advance(now_millis());
                connections.deliver(&out);
            },
        }
    }

    connections.deliver(&[Outbound {
        audience: Audience::All,
        message: ServerMessage::Alert(AlertMsg::error(SHUTDOWN_NOTICE)),
    }]);
    tracing::info!(connections = connections.len(), "Game loop stopped");
    connections.clear();
}

/// Apply one command. Returns `false` when the loop should stop.
fn handle_command(
    gateway: &mut Gateway,
    connections: &mut ConnectionRegistry,
    cmd: GameCommand,
) -> bool {
    match cmd {
        GameCommand::Connect { sender, reply } => {
            let (player_id, out) = gateway.connect(now_millis());
            connections.register(player_id, sender);
            connections.deliver(&out);
            if reply.send(player_id).is_err() {
                // Handler vanished before learning its id.
                connections.unregister(player_id);
                let out = gateway.disconnect(player_id, now_millis());
                connections.deliver(&out);
            }
        },
        GameCommand::Client { player_id, message } => {
            tracing::debug!(player_id, event = message.event_name(), "Client event");
            let out = gateway.handle(player_id, message, now_millis());
            connections.deliver(&out);
        },
        GameCommand::Disconnect { player_id } => {
            connections.unregister(player_id);
            let out = gateway.disconnect(player_id, now_millis());
            connections.deliver(&out);
        },
        GameCommand::Stats { reply } => {
            let world = gateway.world();
            let _ = reply.send(GameStats {
                players: world.player_count(),
                participants: world.participant_count(),
                status: world.round().status,
            });
        },
        GameCommand::Shutdown => {
            tracing::info!("Game loop shutdown requested");
            return false;
        },
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect(tx: &mpsc::Sender<GameCommand>) -> (PlayerId, mpsc::Receiver<Utf8Bytes>) {
        let (sender, rx) = mpsc::channel(64);
        let (reply, id_rx) = oneshot::channel();
        tx.send(GameCommand::Connect { sender, reply }).await.unwrap();
        (id_rx.await.unwrap(), rx)
    }

    async fn stats(tx: &mpsc::Sender<GameCommand>) -> GameStats {
        let (reply, rx) = oneshot::channel();
        tx.send(GameCommand::Stats { reply }).await.unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn connect_welcomes_and_counts() {
        let token = CancellationToken::new();
        let (tx, _handle) =
            spawn_game_loop(GameRules::default(), Duration::from_millis(10), token.clone());

        let (id, mut rx) = connect(&tx).await;
        assert_eq!(id, 1);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.as_str(), r#"{"event":"welcome","data":{"playerId":1}}"#);

        let s = stats(&tx).await;
        assert_eq!(s.players, 1);
        assert_eq!(s.participants, 0);
        assert_eq!(s.status, RoundStatus::Waiting);

        tx.send(GameCommand::Disconnect { player_id: id }).await.unwrap();
        assert_eq!(stats(&tx).await.players, 0);
        token.cancel();
    }

    #[tokio::test]
    async fn shutdown_notifies_and_closes_queues() {
        let token = CancellationToken::new();
        let (tx, handle) = spawn_game_loop(GameRules::default(), Duration::from_millis(10), token);
        let (_, mut rx) = connect(&tx).await;

        tx.send(GameCommand::Shutdown).await.unwrap();
        handle.await.unwrap();

        let mut last = None;
        while let Some(msg) = rx.recv().await {
            last = Some(msg);
        }
        let last = last.unwrap();
        assert!(last.as_str().contains(SHUTDOWN_NOTICE));
    }

    #[tokio::test]
    async fn cancellation_stops_loop() {
        let token = CancellationToken::new();
        let (tx, handle) =
            spawn_game_loop(GameRules::default(), Duration::from_millis(10), token.clone());
        token.cancel();
        handle.await.unwrap();
        assert!(tx.send(GameCommand::Shutdown).await.is_err());
    }
}
