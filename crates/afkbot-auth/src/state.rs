//! Handshake progress as seen from outside.
//!
//! ```text
//!   Idle ──→ AwaitingRegisterReply ──→ AwaitingLoginReply ──→ Authenticated
//!                     │                        │
//!                     └──────────┬─────────────┘
//!                                ▼
//!                          Failed(reason)
//! ```
//!
//! There are no retries: `Authenticated` and `Failed` are terminal for
//! the session that ran the handshake.

use std::fmt;

/// The current state of a session's auth handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Nothing sent yet.
    #[default]
    Idle,
    /// `/register` sent, waiting for the server's answer.
    AwaitingRegisterReply,
    /// `/login` sent, waiting for the server's answer.
    AwaitingLoginReply,
    /// Both steps settled successfully (confirmed or assumed).
    Authenticated,
    /// A step was rejected. Carries the human-readable reason.
    Failed(String),
}

impl AuthState {
    /// Returns `true` once the handshake can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed(_))
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::AwaitingRegisterReply => f.write_str("awaiting register reply"),
            Self::AwaitingLoginReply => f.write_str("awaiting login reply"),
            Self::Authenticated => f.write_str("authenticated"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
