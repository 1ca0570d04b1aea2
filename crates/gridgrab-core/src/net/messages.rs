use serde::{Deserialize, Serialize};

use crate::grid::Direction;
use crate::player::{Player, PlayerId};
use crate::resource::Resource;

// ================================================================
// Client -> server
// ================================================================

/// Inbound events. Framed as `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    SetPlayerInfo(SetPlayerInfoMsg),
    SetReady,
    SetGameTime(SetGameTimeMsg),
    StartGame,
    RestartGame,
    Move(MoveMsg),
    TogglePause(TogglePauseMsg),
    QuitGame(QuitGameMsg),
}

impl ClientMessage {
    /// Wire name of the event, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::SetPlayerInfo(_) => "setPlayerInfo",
            Self::SetReady => "setReady",
            Self::SetGameTime(_) => "setGameTime",
            Self::StartGame => "startGame",
            Self::RestartGame => "restartGame",
            Self::Move(_) => "move",
            Self::TogglePause(_) => "togglePause",
            Self::QuitGame(_) => "quitGame",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPlayerInfoMsg {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetGameTimeMsg {
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMsg {
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TogglePauseMsg {
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuitGameMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// End the round for everyone instead of leaving it alone.
    #[serde(default)]
    pub end_round: bool,
}

// ================================================================
// Server -> client
// ================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    Welcome(WelcomeMsg),
    PlayerInfoAck(PlayerInfoAckMsg),
    UpdateLobby(LobbyMsg),
    UpdateQueue(QueueMsg),
    GameStarted(GameStartedMsg),
    UpdatePlayers(PlayersMsg),
    UpdateResources(ResourcesMsg),
    UpdateTimer(TimerMsg),
    GameEnded(GameEndedMsg),
    GameQuit(GameQuitMsg),
    TogglePause(PauseStateMsg),
    BombExplosion(BombExplosionMsg),
    ResourceCollected,
    Alert(AlertMsg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub player_id: PlayerId,
}

/// Reply to `setPlayerInfo`, sent only to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfoAckMsg {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyMsg {
    pub players: Vec<Player>,
    pub host_id: Option<PlayerId>,
    pub game_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMsg {
    pub queue: Vec<QueueEntry>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStartedMsg {
    pub players: Vec<Player>,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayersMsg {
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesMsg {
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerMsg {
    pub remaining_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndedMsg {
    pub winner: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameQuitMsg {
    pub by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseStateMsg {
    pub paused: bool,
    pub by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BombExplosionMsg {
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMsg {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
}

impl AlertMsg {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }
}
