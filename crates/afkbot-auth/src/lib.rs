//! Chat-driven authentication for afkbot.
//!
//! Many offline-mode servers gate new players behind an auth plugin that
//! is operated through chat commands. This crate performs that exchange:
//!
//! 1. **Phrase classes**: how to read the plugin's replies ([`Step::classify`])
//! 2. **Handshake**: register, then login, each settling on the first
//!    decisive reply or a fail-open timeout ([`AuthHandshake`])
//! 3. **State**: observable progress for the session ([`AuthState`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Session (above)  ← feeds chat in, forwards commands out, logs the outcome
//!     ↕
//! Auth (this crate)  ← decides what to send and when the step is settled
//!     ↕
//! Protocol (below)  ← provides ChatLine, WorldCommand
//! ```

mod auth;
mod error;
mod feed;
mod phrases;
mod state;

pub use auth::{AuthHandshake, AuthOutcome, REPLY_TIMEOUT, StepOutcome};
pub use error::AuthError;
pub use feed::ChatFeed;
pub use phrases::{Rejection, Step, Verdict};
pub use state::AuthState;
