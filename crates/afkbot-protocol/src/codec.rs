//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The session layer doesn't care HOW events and commands are serialized;
//! it just needs something that implements the [`Codec`] trait.
//!
//! Currently we provide [`JsonCodec`], which is what the world gateway
//! speaks. It's human-readable, so a captured session can be read and
//! replayed by hand.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads.
/// - `'static` → the codec owns everything it needs, so it can live
///   inside a long-running session.
///
/// `decode` uses `DeserializeOwned` (vs plain `Deserialize`) so the
/// result doesn't borrow from the input frame, which we drop right after
/// decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use afkbot_protocol::{Codec, JsonCodec, WorldCommand};
///
/// let codec = JsonCodec;
///
/// let cmd = WorldCommand::chat("/login hunter2");
/// let bytes = codec.encode(&cmd).unwrap();
///
/// let decoded: WorldCommand = codec.decode(&bytes).unwrap();
/// assert_eq!(cmd, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
