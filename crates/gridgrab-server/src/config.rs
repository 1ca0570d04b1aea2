use serde::Deserialize;

use gridgrab_core::rules::GameRules;

const CONFIG_FILE: &str = "gridgrab.toml";

/// Reasons a loaded configuration cannot be served.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("listen_addr {0:?} is not a valid socket address")]
    InvalidListenAddr(String),
    #[error("{0} must be > 0")]
    Zero(&'static str),
    #[error("game round bounds are inconsistent: {min}..={max} with default {default}")]
    RoundBounds { min: u32, max: u32, default: u32 },
    #[error("game player bounds are inconsistent: {min}..={max}")]
    PlayerBounds { min: usize, max: usize },
}

/// Top-level server configuration, loaded from `gridgrab.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub limits: LimitsConfig,
    pub game: GameConfig,
    pub shutdown: ShutdownConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            web_root: "public".to_string(),
            limits: LimitsConfig::default(),
            game: GameConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

/// Connection caps, buffer sizes, rate limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    pub ws_rate_limit_per_sec: f64,
    pub player_message_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            ws_rate_limit_per_sec: 20.0,
            player_message_buffer: 256,
        }
    }
}

/// Round rules plus how often the game loop wakes to run due timers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    #[serde(flatten)]
    pub rules: GameRules,
    pub tick_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            tick_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 5,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }

        if self.limits.max_ws_connections == 0 {
            return Err(ConfigError::Zero("limits.max_ws_connections"));
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            return Err(ConfigError::Zero("limits.ws_rate_limit_per_sec"));
        }
        if self.limits.player_message_buffer == 0 {
            return Err(ConfigError::Zero("limits.player_message_buffer"));
        }
        if self.game.tick_ms == 0 {
            return Err(ConfigError::Zero("game.tick_ms"));
        }

        let rules = &self.game.rules;
        if rules.min_round_secs == 0
            || rules.min_round_secs > rules.max_round_secs
            || !(rules.min_round_secs..=rules.max_round_secs).contains(&rules.default_round_secs)
        {
            return Err(ConfigError::RoundBounds {
                min: rules.min_round_secs,
                max: rules.max_round_secs,
                default: rules.default_round_secs,
            });
        }
        if rules.min_players == 0 || rules.min_players > rules.max_players {
            return Err(ConfigError::PlayerBounds {
                min: rules.min_players,
                max: rules.max_players,
            });
        }

        if self.shutdown.grace_period_secs == 0 {
            tracing::warn!("shutdown.grace_period_secs is 0, open connections will be cut off");
        }
        Ok(())
    }

    /// Load config from `gridgrab.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from {CONFIG_FILE}");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {CONFIG_FILE}: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No {CONFIG_FILE} found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply `GRIDGRAB_*` overrides. Unparseable values are ignored.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var("GRIDGRAB_LISTEN_ADDR")
            && !addr.is_empty()
        {
            self.listen_addr = addr;
        }
        if let Some(root) = var("GRIDGRAB_WEB_ROOT")
            && !root.is_empty()
        {
            self.web_root = root;
        }
        if let Some(val) = var("GRIDGRAB_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.max_ws_connections = n;
        }
        if let Some(val) = var("GRIDGRAB_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            self.limits.ws_rate_limit_per_sec = n;
        }
        if let Some(val) = var("GRIDGRAB_ROUND_SECS")
            && let Ok(n) = val.parse::<u32>()
        {
            self.game.rules.default_round_secs = n;
        }
        if let Some(val) = var("GRIDGRAB_MIN_PLAYERS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.game.rules.min_players = n;
        }
        if let Some(val) = var("GRIDGRAB_MAX_PLAYERS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.game.rules.max_players = n;
        }
    }
}
