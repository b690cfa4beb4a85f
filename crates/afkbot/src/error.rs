//! Error types for the afkbot crate.

use std::path::PathBuf;

use afkbot_auth::AuthError;
use afkbot_protocol::ProtocolError;
use afkbot_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum AfkError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The auth handshake could not be set up or was rejected.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The settings file is missing, malformed or inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local I/O failed (e.g. binding the liveness endpoint).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from loading or validating `settings.json`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file parsed but a setting can't be used as written.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}
