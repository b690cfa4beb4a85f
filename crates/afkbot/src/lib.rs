//! # afkbot
//!
//! Keeps an account present in a game world while nobody is playing it.
//!
//! The bot connects to a world gateway, logs in, and then runs a set of
//! optional behaviors configured in `settings.json`:
//!
//! - **auto-auth**: answers the server's register/login plugin over chat
//! - **chat-messages**: says scripted lines, once or on a loop
//! - **position**: walks to a fixed block after spawning
//! - **mob-movement**: wanders around like an idle mob
//! - **anti-afk**: holds jump (and optionally sneak)
//! - **auto-reconnect**: starts a fresh session after the connection ends
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use afkbot::prelude::*;
//!
//! # async fn demo() -> Result<(), AfkError> {
//! let settings = Settings::load("settings.json")?;
//! settings.validate()?;
//!
//! let supervisor = Supervisor::new(WebSocketConnector, JsonCodec, settings);
//! let end = supervisor.run().await;
//! println!("stopped: {end:?}");
//! # Ok(())
//! # }
//! ```

pub mod chat_script;
pub mod config;
mod error;
pub mod health;
pub mod movement;
pub mod session;
pub mod supervisor;
pub mod world;

pub use error::{AfkError, ConfigError};

/// Everything needed to configure and run the bot.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::session::SessionEnd;
    pub use crate::supervisor::Supervisor;
    pub use crate::{AfkError, ConfigError};
    pub use afkbot_protocol::JsonCodec;
    pub use afkbot_transport::{MemoryConnector, WebSocketConnector};
}
