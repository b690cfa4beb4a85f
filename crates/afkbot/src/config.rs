//! `settings.json`: what the bot logs in as and which behaviors it runs.
//!
//! Every behavior block is gated by its own `enabled` flag and defaults to
//! off, so an empty `{}` is a valid (if boring) settings file. Keys are
//! kebab-case, matching the file the bot has always been configured with:
//!
//! ```json
//! {
//!   "bot-account": { "username": "AfkBot", "password": "", "type": "offline" },
//!   "server": { "ip": "localhost", "port": 25565, "version": "1.20.1" },
//!   "position": { "enabled": false, "x": 0, "y": 64, "z": 0 },
//!   "utils": {
//!     "auto-auth": { "enabled": true, "password": "hunter2" },
//!     "anti-afk": { "enabled": true, "sneak": false },
//!     "chat-messages": { "enabled": false, "repeat": false, "repeat-delay": 60, "messages": [] },
//!     "mob-movement": { "enabled": true, "radius": 8, "minDelaySeconds": 5, "maxDelaySeconds": 12 },
//!     "auto-reconnect": { "enabled": true, "delay": 5000 }
//!   },
//!   "health": { "enabled": true, "bind": "0.0.0.0:8000" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use afkbot_protocol::{AccountKind, BlockPos, WorldCommand};
use afkbot_wander::WanderConfig;
use serde::Deserialize;

use crate::ConfigError;

/// Upper bound for any delay or timeout given in seconds (one week).
pub const MAX_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

/// The whole settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub bot_account: BotAccount,
    pub server: ServerSettings,
    pub position: PositionSettings,
    pub utils: Utils,
    pub health: HealthSettings,
}

/// Who the bot logs in as.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotAccount {
    pub username: String,
    /// Account password, for online account services. Empty means none.
    pub password: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
}

impl Default for BotAccount {
    fn default() -> Self {
        Self {
            username: "AfkBot".into(),
            password: String::new(),
            kind: AccountKind::Offline,
        }
    }
}

/// Where the world gateway listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub ip: String,
    pub port: u16,
    /// Game version to request; `None` lets the gateway negotiate.
    pub version: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            ip: "localhost".into(),
            port: 25565,
            version: None,
        }
    }
}

/// Walk to a fixed block once after spawning.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PositionSettings {
    pub enabled: bool,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl PositionSettings {
    pub fn block(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}

/// Optional behaviors, each behind its own `enabled` flag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Utils {
    pub auto_auth: AutoAuth,
    pub chat_messages: ChatMessages,
    pub mob_movement: MobMovement,
    pub anti_afk: AntiAfk,
    pub auto_reconnect: AutoReconnect,
}

/// Register and log in through the server's auth plugin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutoAuth {
    pub enabled: bool,
    pub password: String,
}

/// Say scripted lines after spawning.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChatMessages {
    pub enabled: bool,
    pub messages: Vec<String>,
    /// Cycle through `messages` forever instead of saying each once.
    pub repeat: bool,
    /// Seconds between repeated lines.
    pub repeat_delay: u64,
}

impl Default for ChatMessages {
    fn default() -> Self {
        Self {
            enabled: false,
            messages: Vec::new(),
            repeat: false,
            repeat_delay: 60,
        }
    }
}

/// Wander around like an idle mob.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MobMovement {
    pub enabled: bool,
    pub radius: u32,
    pub min_delay_seconds: u64,
    pub max_delay_seconds: u64,
    pub wander_timeout_seconds: u64,
}

impl Default for MobMovement {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 8,
            min_delay_seconds: 5,
            max_delay_seconds: 12,
            wander_timeout_seconds: 20,
        }
    }
}

impl MobMovement {
    /// Scheduler config for these settings. Cosmetic chances keep their
    /// defaults.
    pub fn wander_config(&self) -> WanderConfig {
        WanderConfig {
            radius: self.radius,
            min_delay: Duration::from_secs(self.min_delay_seconds),
            max_delay: Duration::from_secs(self.max_delay_seconds),
            wander_timeout: Duration::from_secs(self.wander_timeout_seconds),
            ..Default::default()
        }
    }
}

/// Hold jump (and optionally sneak) for the whole session.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct AntiAfk {
    pub enabled: bool,
    pub sneak: bool,
}

/// Start a new session after the connection ends.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AutoReconnect {
    pub enabled: bool,
    /// Milliseconds to wait before reconnecting.
    pub delay: u64,
}

impl Default for AutoReconnect {
    fn default() -> Self {
        Self {
            enabled: false,
            delay: 5000,
        }
    }
}

impl AutoReconnect {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }
}

/// The HTTP liveness endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub enabled: bool,
    pub bind: String,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8000".into(),
        }
    }
}

impl Settings {
    /// Reads and parses a settings file. Does not validate it.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file can't be read,
    /// [`ConfigError::Parse`] if it isn't valid settings JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects combinations the bot can't run with.
    ///
    /// Fixed-position movement and wandering both enabled is allowed but
    /// logged: they compete for the same pathfinder goal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_account.username.trim().is_empty() {
            return Err(invalid("bot-account.username", "must not be empty"));
        }

        let auth = &self.utils.auto_auth;
        if auth.enabled && auth.password.is_empty() {
            return Err(invalid(
                "utils.auto-auth.password",
                "must be set when auto-auth is enabled",
            ));
        }

        let chat = &self.utils.chat_messages;
        if chat.enabled && chat.repeat {
            if chat.messages.is_empty() {
                return Err(invalid(
                    "utils.chat-messages.messages",
                    "repeating chat needs at least one message",
                ));
            }
            if chat.repeat_delay == 0 {
                return Err(invalid(
                    "utils.chat-messages.repeat-delay",
                    "must be at least 1 second",
                ));
            }
        }

        let mob = &self.utils.mob_movement;
        let mut delays = Vec::new();
        if chat.enabled && chat.repeat {
            delays.push(("utils.chat-messages.repeat-delay", chat.repeat_delay));
        }
        if mob.enabled {
            delays.push(("utils.mob-movement.minDelaySeconds", mob.min_delay_seconds));
            delays.push(("utils.mob-movement.maxDelaySeconds", mob.max_delay_seconds));
            delays.push((
                "utils.mob-movement.wanderTimeoutSeconds",
                mob.wander_timeout_seconds,
            ));
        }
        for (key, secs) in delays {
            if secs > MAX_DELAY_SECS {
                return Err(invalid(
                    key,
                    format!("{secs}s is over the {MAX_DELAY_SECS}s limit"),
                ));
            }
        }

        if mob.enabled && mob.min_delay_seconds > mob.max_delay_seconds {
            return Err(invalid(
                "utils.mob-movement.minDelaySeconds",
                format!(
                    "{} is greater than maxDelaySeconds ({})",
                    mob.min_delay_seconds, mob.max_delay_seconds
                ),
            ));
        }

        if self.position.enabled && mob.enabled {
            tracing::warn!(
                "position and mob-movement are both enabled; \
                 wandering will replace the fixed-position goal"
            );
        }

        Ok(())
    }

    /// `host:port` of the world gateway.
    pub fn gateway_addr(&self) -> String {
        format!("{}:{}", self.server.ip, self.server.port)
    }

    /// The first command sent on every new connection.
    pub fn join_command(&self) -> WorldCommand {
        let password = Some(self.bot_account.password.clone())
            .filter(|p| !p.is_empty());
        WorldCommand::Join {
            username: self.bot_account.username.clone(),
            password,
            auth: self.bot_account.kind,
            version: self.server.version.clone(),
        }
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}
