use crate::player::{MAX_NAME_LEN, Player, PlayerId, is_valid_color, normalize_name};
use crate::world::{RoundStatus, World};

/// Reasons a `setPlayerInfo` request is turned down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    #[error("unknown player")]
    UnknownPlayer,
    #[error("name must be 1-{max} characters without control characters", max = MAX_NAME_LEN)]
    InvalidName,
    #[error("color must be #RRGGBB or #RRGGBBAA")]
    InvalidColor,
    #[error("this name is already in use")]
    NameTaken,
}

/// Result of a host asking to start a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartGate {
    /// Requester is not the host. Ignored without feedback.
    NotHost,
    /// A round is already running. Ignored without feedback.
    InProgress,
    /// Not everyone is ready, or too few players are.
    Rejected,
    /// Start with these players, in join order. Everyone else is queued.
    Open(Vec<PlayerId>),
}

/// Register a fresh, unnamed player.
pub fn join(world: &mut World, id: PlayerId) {
    world.insert_player(Player::new(id));
}

/// Remove a player. The last one out resets the round.
pub fn leave(world: &mut World, id: PlayerId) -> Option<Player> {
    let removed = world.remove_player(id)?;
    if world.player_count() == 0 {
        world.reset_round();
    }
    Some(removed)
}

pub fn set_player_info(
    world: &mut World,
    id: PlayerId,
    name: &str,
    color: &str,
) -> Result<(), LobbyError> {
    if world.player(id).is_none() {
        return Err(LobbyError::UnknownPlayer);
    }
    let name = normalize_name(name).ok_or(LobbyError::InvalidName)?;
    if !is_valid_color(color) {
        return Err(LobbyError::InvalidColor);
    }
    if world.players().any(|p| p.id != id && p.name == name) {
        return Err(LobbyError::NameTaken);
    }
    let player = world.player_mut(id).ok_or(LobbyError::UnknownPlayer)?;
    player.name = name;
    player.color = color.to_string();
    Ok(())
}

/// Mark a named player ready. Unnamed or unknown players are ignored.
pub fn set_ready(world: &mut World, id: PlayerId) -> bool {
    match world.player_mut(id) {
        Some(player) if player.is_named() => {
            player.ready = true;
            true
        },
        _ => false,
    }
}

/// Host-only, lobby-only. The requested length is rounded and clamped.
pub fn set_game_time(world: &mut World, id: PlayerId, seconds: f64) -> bool {
    if !world.is_host(id) || world.round().status != RoundStatus::Waiting {
        return false;
    }
    let Some(secs) = world.rules().clamp_round_secs(seconds) else {
        return false;
    };
    world.round_mut().game_time = secs;
    true
}

/// Check whether `requester` may start a round right now.
pub fn start_gate(world: &World, requester: PlayerId) -> StartGate {
    if !world.is_host(requester) {
        return StartGate::NotHost;
    }
    if world.round().is_started() {
        return StartGate::InProgress;
    }
    let all_ready = world.players().all(|p| p.ready && p.is_named());
    if !all_ready || world.player_count() < world.rules().min_players {
        return StartGate::Rejected;
    }
    StartGate::Open(roster(world))
}

/// Players for a restart: named players in join order, capped. `None` if too few.
pub fn restart_roster(world: &World) -> Option<Vec<PlayerId>> {
    let ids = roster(world);
    (ids.len() >= world.rules().min_players).then_some(ids)
}

fn roster(world: &World) -> Vec<PlayerId> {
    world
        .players()
        .filter(|p| p.is_named())
        .map(|p| p.id)
        .take(world.rules().max_players)
        .collect()
}
