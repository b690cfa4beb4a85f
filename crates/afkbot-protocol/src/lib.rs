//! Wire protocol for afkbot.
//!
//! This crate defines the "language" the bot and the world gateway speak:
//!
//! - **Types** ([`WorldEvent`], [`WorldCommand`], [`Goal`], etc.):
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (WorldEvent / WorldCommand) → Session
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AccountKind, BlockPos, ChatLine, Control, Goal, MovementProfile,
    Position, WorldCommand, WorldEvent,
};
