//! Resource spawning, collection, effects, and the periodic processors.
//!
//! Every function here is a no-op outside a running round (started and not
//! paused) except [`apply_effect`], which is only reached from collection.

use crate::effects::Effect;
use crate::grid::Cell;
use crate::player::{Player, PlayerId};
use crate::resource::{RESOURCE_TABLE, Resource, ResourceKind, draw_weighted};
use crate::rules::{
    BLAST_DAMAGE, BLAST_RADIUS, MAGNET_RADIUS, POISON_DAMAGE, POISON_INTERVAL_MS, SPAWN_ATTEMPTS,
    TELEPORT_ATTEMPTS,
};
use crate::world::World;

/// What a bomb sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BombReport {
    /// Blast centres, in the order the bombs went off.
    pub blasts: Vec<Cell>,
    pub players_hit: bool,
}

impl BombReport {
    pub fn is_empty(&self) -> bool {
        self.blasts.is_empty()
    }
}

/// Credit `points` to a player, doubled while double points is active.
fn award(player: &mut Player, points: i32, now: u64) {
    let multiplier = if player.effects.has_double_points(now) { 2 } else { 1 };
    player.add_points(i64::from(points) * multiplier);
}

/// Score a collected resource and apply its effect.
fn credit(world: &mut World, player_id: PlayerId, resource: &Resource, now: u64) {
    if let Some(player) = world.players.get_mut(&player_id) {
        award(player, resource.points, now);
    }
    if let Some(effect) = resource.effect {
        apply_effect(world, player_id, effect, now);
    }
}

/// Drop one resource on a random free cell.
///
/// Gives up silently after a bounded number of placement attempts.
pub fn spawn_resource(world: &mut World, now: u64) -> Option<ResourceKind> {
    if !world.round.is_running() {
        return None;
    }
    let spec = draw_weighted(&RESOURCE_TABLE, &mut world.rng)?;
    let Some(cell) = world.random_free_cell(SPAWN_ATTEMPTS, None) else {
        tracing::debug!(kind = ?spec.kind, "No free cell for spawn, skipping");
        return None;
    };
    let resource = Resource::spawn(spec, cell, now, &mut world.rng);
    world.resources.push(resource);
    Some(spec.kind)
}

/// Consume everything on the player's cell.
///
/// A live bomb is disarmed for its points with no blast. A bomb whose fuse
/// has already run out stays put and goes off on the next bomb sweep.
/// Returns whether anything was picked up.
pub fn collect_at(world: &mut World, player_id: PlayerId, now: u64) -> bool {
    let Some(cell) = world.player(player_id).map(Player::cell) else {
        return false;
    };

    let mut taken = Vec::new();
    world.resources.retain(|r| {
        if r.cell() != cell || (r.is_bomb() && !r.is_disarmable(now)) {
            return true;
        }
        taken.push(r.clone());
        false
    });

    for resource in &taken {
        credit(world, player_id, resource, now);
    }
    !taken.is_empty()
}

/// Apply an effect to a player. Teleport moves them to a free cell, or
/// leaves them where they are when none turns up.
pub fn apply_effect(world: &mut World, player_id: PlayerId, effect: Effect, now: u64) {
    if effect == Effect::Teleport {
        let target = world.random_free_cell(TELEPORT_ATTEMPTS, Some(player_id));
        if let Some(cell) = target
            && let Some(player) = world.players.get_mut(&player_id)
        {
            player.set_cell(cell);
        }
        return;
    }
    if let Some(player) = world.players.get_mut(&player_id) {
        player.effects.apply(effect, now);
    }
}

/// Pull nearby non-bomb resources into every player holding a magnet.
pub fn process_magnets(world: &mut World, now: u64) -> bool {
    if !world.round.is_running() {
        return false;
    }
    let holders: Vec<(PlayerId, Cell)> = world
        .participants()
        .filter(|p| p.effects.has_magnet(now))
        .map(|p| (p.id, p.cell()))
        .collect();

    let mut pulled_any = false;
    for (player_id, at) in holders {
        let (pulled, kept): (Vec<Resource>, Vec<Resource>) = std::mem::take(&mut world.resources)
            .into_iter()
            .partition(|r| {
                let d = r.cell().manhattan(at);
                !r.is_bomb() && d > 0 && d <= MAGNET_RADIUS
            });
        world.resources = kept;
        for resource in &pulled {
            credit(world, player_id, resource, now);
        }
        pulled_any |= !pulled.is_empty();
    }
    pulled_any
}

/// Detonate every bomb whose fuse has run out.
///
/// Spent bombs are taken off the board first and then go off one by one in
/// spawn order, so a blast never swallows another spent bomb. Each blast
/// costs every participant in range some score and destroys the other
/// resources in range, including bombs whose fuse is still burning.
pub fn process_bombs(world: &mut World, now: u64) -> BombReport {
    let mut report = BombReport::default();
    if !world.round.is_running() {
        return report;
    }
    let (spent, rest): (Vec<Resource>, Vec<Resource>) = std::mem::take(&mut world.resources)
        .into_iter()
        .partition(|r| r.is_fuse_spent(now));
    world.resources = rest;

    for bomb in &spent {
        let at = bomb.cell();
        for player in world.players.values_mut().filter(|p| p.in_game) {
            if player.cell().manhattan(at) <= BLAST_RADIUS {
                player.add_points(-BLAST_DAMAGE);
                report.players_hit = true;
            }
        }
        world
            .resources
            .retain(|r| r.cell().manhattan(at) > BLAST_RADIUS);
        report.blasts.push(at);
    }
    report
}

/// Tick poison damage. Returns whether any score changed hands.
pub fn process_poison(world: &mut World, now: u64) -> bool {
    if !world.round.is_running() {
        return false;
    }
    let mut hit = false;
    for player in world.players.values_mut().filter(|p| p.in_game) {
        if player.effects.poison_due(now, POISON_INTERVAL_MS) {
            player.add_points(-POISON_DAMAGE);
            player.effects.last_poison_damage = Some(now);
            hit = true;
        }
    }
    hit
}

/// Drop resources past their lifetime. Returns whether any were removed.
pub fn purge_expired(world: &mut World, now: u64) -> bool {
    if !world.round.is_running() {
        return false;
    }
    let before = world.resources.len();
    world.resources.retain(|r| !r.is_expired(now));
    world.resources.len() != before
}
