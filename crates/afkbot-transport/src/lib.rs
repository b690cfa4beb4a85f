//! Transport abstraction layer for afkbot.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! how the bot reaches the world gateway.
//!
//! - [`WebSocketConnector`] dials a real gateway (feature `websocket`).
//! - [`MemoryConnector`] / [`MemoryConnection::pair`] keep both ends in
//!   the same process, for tests and local dry runs.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryConnection, MemoryConnector};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs across all connectors.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
///
/// Every reconnect produces a new connection with a new ID, which makes
/// it easy to tell sessions apart in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide connection ID.
    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens new connections to the world gateway.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Dials `addr` and returns the open connection.
    async fn connect(
        &self,
        addr: &str,
    ) -> Result<Self::Connection, TransportError>;
}

/// A single connection that can send and receive bytes.
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    /// Must be cancel-safe: the session polls it inside `select!`.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), TransportError>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
