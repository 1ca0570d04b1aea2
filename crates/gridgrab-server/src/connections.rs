use std::collections::BTreeMap;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;

use gridgrab_core::net::outbox::Outbound;
use gridgrab_core::net::protocol::encode_server_message;
use gridgrab_core::player::PlayerId;

/// Outbound queues of every live connection, keyed by player.
#[derive(Default)]
pub struct ConnectionRegistry {
    senders: BTreeMap<PlayerId, mpsc::Sender<Utf8Bytes>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, player_id: PlayerId, sender: mpsc::Sender<Utf8Bytes>) {
        self.senders.insert(player_id, sender);
    }

    pub fn unregister(&mut self, player_id: PlayerId) {
        self.senders.remove(&player_id);
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Drop every sender, ending each connection's writer.
    pub fn clear(&mut self) {
        self.senders.clear();
    }

    /// Encode each message once and queue it for its audience.
    ///
    /// Fire-and-forget: a full or closed queue drops the message for that
    /// connection only.
    pub fn deliver(&self, outbound: &[Outbound]) {
        for item in outbound {
            let data = match encode_server_message(&item.message) {
                Ok(text) => Utf8Bytes::from(text),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode server message");
                    continue;
                },
            };
            for (&player_id, sender) in &self.senders {
                if !item.audience.includes(player_id) {
                    continue;
                }
                if let Err(e) = sender.try_send(data.clone()) {
                    tracing::debug!(player_id, error = %e, "Dropped message for slow client");
                }
            }
        }
    }
}
