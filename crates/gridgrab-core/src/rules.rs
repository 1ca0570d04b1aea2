use serde::Deserialize;

/// Resources older than this are purged by the cleanup task.
pub const RESOURCE_LIFETIME_MS: u64 = 7_000;
/// Placement attempts for a new resource before the spawn is skipped.
pub const SPAWN_ATTEMPTS: usize = 20;
/// Placement attempts for a teleport before the player is left in place.
pub const TELEPORT_ATTEMPTS: usize = 50;
/// Magnet pull radius (Manhattan).
pub const MAGNET_RADIUS: u32 = 3;
/// Bomb blast radius (Manhattan).
pub const BLAST_RADIUS: u32 = 3;
/// Score lost by each player caught in a blast.
pub const BLAST_DAMAGE: i64 = 3;
/// Score lost per poison tick.
pub const POISON_DAMAGE: i64 = 1;
/// Minimum gap between two poison hits on the same player.
pub const POISON_INTERVAL_MS: u64 = 2_000;
/// Bomb fuse range in milliseconds, `[min, max)`.
pub const FUSE_MS: std::ops::Range<u64> = 1_000..7_000;

/// Tunable round and lobby limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Round length used until the host picks another, in seconds.
    pub default_round_secs: u32,
    pub min_round_secs: u32,
    pub max_round_secs: u32,
    /// Ready players needed to start, and players kept in a round.
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            default_round_secs: 60,
            min_round_secs: 15,
            max_round_secs: 900,
            min_players: 2,
            max_players: 4,
        }
    }
}

impl GameRules {
    /// Round and clamp a requested round length. Non-finite input is rejected.
    pub fn clamp_round_secs(&self, requested: f64) -> Option<u32> {
        if !requested.is_finite() {
            return None;
        }
        let lo = f64::from(self.min_round_secs);
        let hi = f64::from(self.max_round_secs);
        // Bounded by the u32 limits above, so the cast is exact.
        Some(requested.round().clamp(lo, hi) as u32)
    }

    /// Alert text shown when a start request fails the player gate.
    pub fn gate_message(&self) -> String {
        format!(
            "there must be at least {}-{} players",
            self.min_players, self.max_players
        )
    }
}
