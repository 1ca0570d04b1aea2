use serde::{Deserialize, Serialize};

/// Effect granted by collecting a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    DoublePoints,
    Magnet,
    Teleport,
    Freeze,
    Confusion,
    Poison,
    GhostMode,
}

impl Effect {
    /// How long the effect lasts in milliseconds. `None` for instant effects.
    pub fn duration_ms(self) -> Option<u64> {
        match self {
            Self::DoublePoints => Some(7_000),
            Self::Magnet => Some(6_000),
            Self::Freeze => Some(4_000),
            Self::Confusion => Some(6_000),
            Self::Poison => Some(6_000),
            Self::GhostMode => Some(10_000),
            Self::Teleport => None,
        }
    }
}

/// Absolute expiry instants (Unix ms) for each timed effect on a player.
///
/// An effect is active while `now < until`. Missing or past values are
/// inactive, so nothing needs to be cleared when an effect runs out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEffects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_points_until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confused_until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poisoned_until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghost_mode_until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_poison_damage: Option<u64>,
}

fn active(until: Option<u64>, now: u64) -> bool {
    until.is_some_and(|t| now < t)
}

impl StatusEffects {
    /// Stamp a timed effect. Teleport has no timestamp and is ignored here.
    pub fn apply(&mut self, effect: Effect, now: u64) {
        let Some(duration) = effect.duration_ms() else {
            return;
        };
        let until = Some(now + duration);
        match effect {
            Effect::DoublePoints => self.double_points_until = until,
            Effect::Magnet => self.magnet_until = until,
            Effect::Freeze => self.frozen_until = until,
            Effect::Confusion => self.confused_until = until,
            Effect::Poison => {
                self.poisoned_until = until;
                self.last_poison_damage = Some(now);
            },
            Effect::GhostMode => self.ghost_mode_until = until,
            Effect::Teleport => {},
        }
    }

    pub fn has_double_points(&self, now: u64) -> bool {
        active(self.double_points_until, now)
    }

    pub fn has_magnet(&self, now: u64) -> bool {
        active(self.magnet_until, now)
    }

    pub fn is_frozen(&self, now: u64) -> bool {
        active(self.frozen_until, now)
    }

    pub fn is_confused(&self, now: u64) -> bool {
        active(self.confused_until, now)
    }

    pub fn is_poisoned(&self, now: u64) -> bool {
        active(self.poisoned_until, now)
    }

    pub fn is_ghost(&self, now: u64) -> bool {
        active(self.ghost_mode_until, now)
    }

    /// True when poison is active and a full tick has passed since the last hit.
    pub fn poison_due(&self, now: u64, interval_ms: u64) -> bool {
        self.is_poisoned(now)
            && now.saturating_sub(self.last_poison_damage.unwrap_or(0)) >= interval_ms
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
