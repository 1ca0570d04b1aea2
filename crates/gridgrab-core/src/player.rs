use serde::{Deserialize, Serialize};

use crate::effects::StatusEffects;
use crate::grid::Cell;

/// Connection-scoped player identifier. Allocated in join order.
pub type PlayerId = u64;

/// Color given to a player before they pick one.
pub const DEFAULT_COLOR: &str = "#ffffffff";

/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// A connected participant. Owned by its connection and dropped on disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub x: u8,
    pub y: u8,
    pub score: u32,
    pub ready: bool,
    pub in_game: bool,
    #[serde(flatten)]
    pub effects: StatusEffects,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            name: String::new(),
            color: DEFAULT_COLOR.to_string(),
            x: 0,
            y: 0,
            score: 0,
            ready: false,
            in_game: false,
            effects: StatusEffects::default(),
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }

    pub fn set_cell(&mut self, cell: Cell) {
        self.x = cell.x;
        self.y = cell.y;
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    /// Apply a signed score change. The score never drops below zero.
    pub fn add_points(&mut self, delta: i64) {
        let next = i64::from(self.score).saturating_add(delta);
        self.score = u32::try_from(next.max(0)).unwrap_or(u32::MAX);
    }

    /// Name used when attributing an action to this player.
    pub fn display_name(&self) -> &str {
        if self.is_named() { &self.name } else { "Unknown" }
    }
}

/// Trim and check a requested display name.
pub fn normalize_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN || name.chars().any(char::is_control) {
        return None;
    }
    Some(name.to_string())
}

/// Accept `#RRGGBB` or `#RRGGBBAA`.
pub fn is_valid_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}
