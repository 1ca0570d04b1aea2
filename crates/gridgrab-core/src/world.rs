use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::grid::Cell;
use crate::player::{Player, PlayerId};
use crate::resource::Resource;
use crate::rules::GameRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Waiting,
    Started,
}

/// The single round register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub status: RoundStatus,
    pub paused: bool,
    /// Configured round length in seconds.
    pub game_time: u32,
    /// Seconds left in the current round.
    pub remaining_time: u32,
}

impl Round {
    pub fn is_started(&self) -> bool {
        self.status == RoundStatus::Started
    }

    /// Started and not paused: the state in which timed work may run.
    pub fn is_running(&self) -> bool {
        self.is_started() && !self.paused
    }
}

/// Owned game state: players, resources, the round, and the random source.
///
/// Players are keyed by id and ids are handed out in join order, so the
/// first entry is always the earliest-joined connected player (the host).
pub struct World {
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) round: Round,
    pub(crate) rules: GameRules,
    pub(crate) rng: StdRng,
}

impl World {
    pub fn new(rules: GameRules, rng: StdRng) -> Self {
        let round = Round {
            status: RoundStatus::Waiting,
            paused: false,
            game_time: rules.default_round_secs,
            remaining_time: 0,
        };
        Self {
            players: BTreeMap::new(),
            resources: Vec::new(),
            round,
            rules,
            rng,
        }
    }

    pub fn seeded(rules: GameRules, seed: u64) -> Self {
        Self::new(rules, StdRng::seed_from_u64(seed))
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn host_id(&self) -> Option<PlayerId> {
        self.players.keys().next().copied()
    }

    pub fn is_host(&self, id: PlayerId) -> bool {
        self.host_id() == Some(id)
    }

    /// All connected players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn insert_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Players taking part in the current round.
    pub fn participants(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.in_game)
    }

    pub fn participant_ids(&self) -> Vec<PlayerId> {
        self.participants().map(|p| p.id).collect()
    }

    pub fn participant_count(&self) -> usize {
        self.participants().count()
    }

    /// Connected players sitting out the current round.
    pub fn queued(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| !p.in_game)
    }

    pub fn queued_ids(&self) -> Vec<PlayerId> {
        self.queued().map(|p| p.id).collect()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn push_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn clear_resources(&mut self) {
        self.resources.clear();
    }

    /// A cell holding a participant (other than `except`) or any resource.
    pub fn is_occupied(&self, cell: Cell, except: Option<PlayerId>) -> bool {
        self.participants()
            .any(|p| Some(p.id) != except && p.cell() == cell)
            || self.resources.iter().any(|r| r.cell() == cell)
    }

    /// Draw random cells until a free one turns up, at most `attempts` times.
    pub fn random_free_cell(&mut self, attempts: usize, except: Option<PlayerId>) -> Option<Cell> {
        for _ in 0..attempts {
            let cell = Cell::random(&mut self.rng);
            if !self.is_occupied(cell, except) {
                return Some(cell);
            }
        }
        None
    }

    /// Back to an idle lobby. Players are kept; resources and round progress are dropped.
    pub fn reset_round(&mut self) {
        self.round.status = RoundStatus::Waiting;
        self.round.paused = false;
        self.round.remaining_time = 0;
        self.resources.clear();
    }
}
