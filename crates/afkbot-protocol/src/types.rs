//! Core protocol types for afkbot's wire format.
//!
//! This module defines every type that travels between the bot and the
//! world gateway: the events the world reports ([`WorldEvent`]) and the
//! commands the bot issues ([`WorldCommand`]), plus the small value types
//! they carry (positions, movement goals, control inputs).
//!
//! The gateway owns the actual game client and the pathfinder. The bot
//! never simulates the world itself; it only decides WHAT to do and sends
//! those decisions as commands.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A precise entity position in world space.
///
/// Entities move continuously, so coordinates are floating point. Movement
/// goals, on the other hand, target whole blocks; see [`BlockPos`] and
/// [`Position::block`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the block this position is inside of.
    ///
    /// Uses `floor`, not truncation: an entity standing at `x = -0.5` is
    /// inside block `-1`, not block `0`.
    pub fn block(&self) -> BlockPos {
        BlockPos {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            z: self.z.floor() as i32,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Control inputs
// ---------------------------------------------------------------------------

/// A movement control input, as if a player were holding a key.
///
/// Controls are "sustained": once set to `true` they stay active until
/// explicitly released with `SetControl { active: false }` or
/// [`WorldCommand::ClearControls`].
///
/// `#[serde(rename_all = "lowercase")]` puts them on the wire as
/// `"jump"`, `"forward"`, ... which is what the gateway expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sprint,
    Sneak,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Forward => "forward",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Jump => "jump",
            Self::Sprint => "sprint",
            Self::Sneak => "sneak",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Movement goals
// ---------------------------------------------------------------------------

/// A movement objective handed to the gateway's pathfinder.
///
/// The pathfinder holds exactly ONE goal at a time. Sending a new goal
/// replaces the old one; sending `SetGoal { goal: None }` cancels it.
///
/// `#[serde(tag = "kind")]` produces `{ "kind": "near", "x": 1, ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Goal {
    /// Get within `radius` blocks of the target.
    Near { x: i32, y: i32, z: i32, radius: u32 },

    /// Stand exactly on the target block.
    Exact { x: i32, y: i32, z: i32 },
}

impl Goal {
    /// A "move near" goal around `target` with the given tolerance.
    pub fn near(target: BlockPos, radius: u32) -> Self {
        Self::Near {
            x: target.x,
            y: target.y,
            z: target.z,
            radius,
        }
    }

    /// A "move to exactly this block" goal.
    pub fn exact(target: BlockPos) -> Self {
        Self::Exact {
            x: target.x,
            y: target.y,
            z: target.z,
        }
    }

    /// The block this goal is centered on.
    pub fn target(&self) -> BlockPos {
        match *self {
            Self::Near { x, y, z, .. } | Self::Exact { x, y, z } => {
                BlockPos { x, y, z }
            }
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Near { radius, .. } => {
                write!(f, "near {} (r={radius})", self.target())
            }
            Self::Exact { .. } => write!(f, "exactly {}", self.target()),
        }
    }
}

/// How the pathfinder is allowed to move.
///
/// The pathfinder needs to know which game version it's moving in before
/// it can plan anything (block shapes and physics differ between
/// versions). That's why a profile can only be built once the world has
/// told us its version (see [`WorldEvent::Spawn`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementProfile {
    /// Game version the profile was built for.
    pub version: String,
    /// Whether the pathfinder may break blocks in the way.
    pub can_dig: bool,
    /// Whether the pathfinder may sprint.
    pub allow_sprinting: bool,
    /// Whether the pathfinder may jump across gaps.
    pub allow_parkour: bool,
}

impl MovementProfile {
    /// The pathfinder's default movement rules for a game version.
    pub fn for_version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            can_dig: true,
            allow_sprinting: true,
            allow_parkour: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Which account service the gateway should log in with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// No account service: the server must accept any username.
    #[default]
    Offline,
    Microsoft,
    Mojang,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// One line of chat, as seen by the bot.
///
/// Chat is a shared broadcast channel: server plugins, other players and
/// the bot all talk on it. Anything that waits for a specific reply (like
/// the auth handshake) has to pick its line out of unrelated traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub sender: String,
    pub message: String,
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.sender, self.message)
    }
}

// ---------------------------------------------------------------------------
// WorldEvent: gateway → bot
// ---------------------------------------------------------------------------

/// Something that happened in the world.
///
/// `#[serde(tag = "type")]` makes this "internally tagged":
///   `{ "type": "chat", "sender": "Server", "message": "hi" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    /// The bot entered the world (first join or respawn).
    ///
    /// `version` is `None` when the gateway doesn't know the game version
    /// yet; no [`MovementProfile`] can be built in that case.
    Spawn {
        position: Position,
        #[serde(default)]
        version: Option<String>,
    },

    /// A chat line arrived.
    Chat { sender: String, message: String },

    /// The bot's position changed.
    Moved { position: Position },

    /// The pathfinder reached its current goal.
    GoalReached { position: Position },

    /// The bot died. The gateway respawns it automatically.
    Death {
        #[serde(default)]
        position: Option<Position>,
    },

    /// The server kicked the bot. A `SessionEnd` normally follows.
    Kicked { reason: String },

    /// A low-level client error. Informational.
    Error { message: String },

    /// The world connection is over.
    SessionEnd {
        #[serde(default)]
        reason: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// WorldCommand: bot → gateway
// ---------------------------------------------------------------------------

/// Something the bot wants the world client to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldCommand {
    /// First command on every connection: who to log in as.
    Join {
        username: String,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        auth: AccountKind,
        #[serde(default)]
        version: Option<String>,
    },

    /// Send a chat line (or a slash command).
    Chat { text: String },

    /// Press or release a control input.
    SetControl { control: Control, active: bool },

    /// Release every control input.
    ClearControls,

    /// Turn the head. `yaw` and `pitch` are radians.
    Look { yaw: f32, pitch: f32 },

    /// Configure how the pathfinder may move.
    SetMovementProfile { profile: MovementProfile },

    /// Replace the pathfinder goal; `None` cancels it.
    SetGoal { goal: Option<Goal> },
}

impl WorldCommand {
    /// Shorthand for [`WorldCommand::Chat`].
    pub fn chat(text: impl Into<String>) -> Self {
        Self::Chat { text: text.into() }
    }
}

// =========================================================================
// Tests
// =========================================================================
