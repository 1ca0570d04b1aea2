use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::effects::Effect;
use crate::grid::Cell;
use crate::rules::{FUSE_MS, RESOURCE_LIFETIME_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Bronze,
    Silver,
    Gold,
    DoublePoints,
    Magnet,
    Teleport,
    TimeBomb,
    ConfusionTrap,
    FreezeTrap,
    PoisonTrap,
    GhostMode,
    Diamond,
}

/// One row of the spawn table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub points: i32,
    pub rarity: f64,
    pub color: &'static str,
    pub symbol: &'static str,
    pub effect: Option<Effect>,
}

const fn spec(
    kind: ResourceKind,
    points: i32,
    rarity: f64,
    color: &'static str,
    symbol: &'static str,
    effect: Option<Effect>,
) -> ResourceSpec {
    ResourceSpec {
        kind,
        points,
        rarity,
        color,
        symbol,
        effect,
    }
}

/// Spawn table. Order matters: earlier rows win ties in the weighted draw.
pub static RESOURCE_TABLE: [ResourceSpec; 12] = [
    spec(ResourceKind::Bronze, 1, 0.35, "#B8621E", "🪙", None),
    spec(ResourceKind::Silver, 2, 0.25, "#C0C0C0", "💵", None),
    spec(ResourceKind::Gold, 3, 0.15, "#FFD700", "💰", None),
    spec(
        ResourceKind::DoublePoints,
        0,
        0.10,
        "#FFE55C",
        "✨",
        Some(Effect::DoublePoints),
    ),
    spec(ResourceKind::Magnet, 0, 0.06, "#FF4444", "🧲", Some(Effect::Magnet)),
    spec(ResourceKind::Teleport, 0, 0.04, "#9966FF", "🌀", Some(Effect::Teleport)),
    spec(ResourceKind::TimeBomb, 4, 0.025, "#FF0000", "💣", None),
    spec(
        ResourceKind::ConfusionTrap,
        0,
        0.01,
        "#FF69B4",
        "😵",
        Some(Effect::Confusion),
    ),
    spec(ResourceKind::FreezeTrap, 0, 0.008, "#00BFFF", "🧊", Some(Effect::Freeze)),
    spec(ResourceKind::PoisonTrap, -2, 0.007, "#32CD32", "☣️", Some(Effect::Poison)),
    spec(ResourceKind::GhostMode, 2, 0.05, "#9966CC", "👻", Some(Effect::GhostMode)),
    spec(ResourceKind::Diamond, 10, 0.005, "#68dbfaff", "💎", None),
];

/// Sum of every row's rarity. Rarities are relative weights, not probabilities.
pub fn total_weight(table: &[ResourceSpec]) -> f64 {
    table.iter().map(|r| r.rarity).sum()
}

/// Draw a row with probability `rarity / total_weight`.
pub fn draw_weighted<'a, R: Rng + ?Sized>(
    table: &'a [ResourceSpec],
    rng: &mut R,
) -> Option<&'a ResourceSpec> {
    let total = total_weight(table);
    if total <= 0.0 {
        return table.last();
    }
    pick_weighted(table, rng.random_range(0.0..total))
}

/// Pick the first row whose cumulative rarity reaches `draw`, with `draw`
/// in `[0, total_weight)`.
///
/// Falls back to the last row when rounding leaves `draw` above the total.
pub fn pick_weighted(table: &[ResourceSpec], draw: f64) -> Option<&ResourceSpec> {
    let mut acc = 0.0;
    for row in table {
        acc += row.rarity;
        if draw <= acc {
            return Some(row);
        }
    }
    table.last()
}

impl ResourceKind {
    pub fn spec(self) -> &'static ResourceSpec {
        // Every kind has exactly one row, and rows are in declaration order.
        &RESOURCE_TABLE[self as usize]
    }
}

/// A resource lying on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub x: u8,
    pub y: u8,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub points: i32,
    pub color: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    pub spawn_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode_time: Option<u64>,
    #[serde(default)]
    pub can_deactivate: bool,
}

impl Resource {
    /// Build a resource from its table row. Bombs draw their fuse from `rng`.
    pub fn spawn<R: Rng + ?Sized>(spec: &ResourceSpec, cell: Cell, now: u64, rng: &mut R) -> Self {
        let is_bomb = spec.kind == ResourceKind::TimeBomb;
        Self {
            x: cell.x,
            y: cell.y,
            kind: spec.kind,
            points: spec.points,
            color: spec.color.to_string(),
            symbol: spec.symbol.to_string(),
            effect: spec.effect,
            spawn_time: now,
            explode_time: is_bomb.then(|| now + rng.random_range(FUSE_MS)),
            can_deactivate: is_bomb,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }

    pub fn is_bomb(&self) -> bool {
        self.kind == ResourceKind::TimeBomb
    }

    /// A bomb can be stepped on for points until its fuse runs out.
    pub fn is_disarmable(&self, now: u64) -> bool {
        self.is_bomb() && self.can_deactivate && self.explode_time.is_some_and(|t| now < t)
    }

    pub fn is_fuse_spent(&self, now: u64) -> bool {
        self.is_bomb() && self.explode_time.is_some_and(|t| t <= now)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.spawn_time) >= RESOURCE_LIFETIME_MS
    }
}
