use crate::player::PlayerId;
use crate::world::World;

use super::messages::{
    LobbyMsg, PlayersMsg, QueueEntry, QueueMsg, ResourcesMsg, ServerMessage, TimerMsg,
};

/// Who a message is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    All,
    Player(PlayerId),
    Players(Vec<PlayerId>),
}

impl Audience {
    pub fn includes(&self, id: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => *p == id,
            Self::Players(ids) => ids.contains(&id),
        }
    }
}

/// A message and its recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub message: ServerMessage,
}

/// Ordered collection of outbound messages produced while handling one event.
#[derive(Debug, Default)]
pub struct Outbox {
    items: Vec<Outbound>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&mut self, message: ServerMessage) {
        self.items.push(Outbound {
            audience: Audience::All,
            message,
        });
    }

    pub fn send_to(&mut self, id: PlayerId, message: ServerMessage) {
        self.items.push(Outbound {
            audience: Audience::Player(id),
            message,
        });
    }

    /// Send to a group. Nothing is queued for an empty group.
    pub fn send_to_many(&mut self, ids: Vec<PlayerId>, message: ServerMessage) {
        if ids.is_empty() {
            return;
        }
        self.items.push(Outbound {
            audience: Audience::Players(ids),
            message,
        });
    }

    pub fn broadcast_lobby(&mut self, world: &World) {
        self.broadcast(ServerMessage::UpdateLobby(LobbyMsg {
            players: world.players().cloned().collect(),
            host_id: world.host_id(),
            game_time: world.round().game_time,
        }));
    }

    /// Send the in-round player list to everyone.
    pub fn broadcast_players(&mut self, world: &World) {
        self.broadcast(ServerMessage::UpdatePlayers(PlayersMsg {
            players: world.participants().cloned().collect(),
        }));
    }

    pub fn broadcast_resources(&mut self, world: &World) {
        self.broadcast(ServerMessage::UpdateResources(ResourcesMsg {
            resources: world.resources().to_vec(),
        }));
    }

    pub fn broadcast_timer(&mut self, world: &World) {
        self.broadcast(ServerMessage::UpdateTimer(TimerMsg {
            remaining_time: world.round().remaining_time,
        }));
    }

    /// Send the waiting queue to everyone in it.
    pub fn send_queue(&mut self, world: &World) {
        let queue: Vec<QueueEntry> = world
            .queued()
            .map(|p| QueueEntry {
                id: p.id,
                name: p.name.clone(),
                color: p.color.clone(),
            })
            .collect();
        let ids = queue.iter().map(|q| q.id).collect();
        let count = queue.len();
        self.send_to_many(ids, ServerMessage::UpdateQueue(QueueMsg { queue, count }));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<Outbound> {
        self.items
    }
}
