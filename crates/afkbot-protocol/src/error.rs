//! Error types for the protocol layer.
//!
//! Each crate in afkbot defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization or
//! deserialization, not in networking or session logic.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, or a
    /// truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but makes no sense at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
