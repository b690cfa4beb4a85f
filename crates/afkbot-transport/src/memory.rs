//! In-process connections backed by Tokio channels.
//!
//! A [`MemoryConnection::pair`] is two connected ends: whatever one end
//! sends, the other receives. Dropping or closing one end makes the other
//! end's `recv` return `Ok(None)`, exactly like a cleanly closed socket.

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, Connector, TransportError};

/// One end of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    /// `None` once this end has been closed.
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MemoryConnection {
    /// Creates two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        let a = Self {
            id: ConnectionId::next(),
            tx: Mutex::new(Some(a_tx)),
            rx: Mutex::new(a_rx),
        };
        let b = Self {
            id: ConnectionId::next(),
            tx: Mutex::new(Some(b_tx)),
            rx: Mutex::new(b_rx),
        };
        (a, b)
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let tx = self.tx.lock().await;
        let tx = tx.as_ref().ok_or_else(|| {
            TransportError::ConnectionClosed("local end closed".into())
        })?;
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        // `mpsc::UnboundedReceiver::recv` is cancel-safe.
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.tx.lock().await.take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// A [`Connector`] that hands the far end of every new connection to
/// whoever plays the world.
///
/// ```rust
/// # async fn demo() {
/// use afkbot_transport::{Connection, Connector, MemoryConnector};
///
/// let (connector, mut accepted) = MemoryConnector::new();
/// let bot_end = connector.connect("memory").await.unwrap();
/// let world_end = accepted.recv().await.unwrap();
///
/// bot_end.send(b"hello").await.unwrap();
/// assert_eq!(world_end.recv().await.unwrap(), Some(b"hello".to_vec()));
/// # }
/// ```
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<MemoryConnection>,
}

impl MemoryConnector {
    /// Creates a connector and the receiver that yields the world-side
    /// end of each connection it opens.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryConnection>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        (Self { accepted }, rx)
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(
        &self,
        addr: &str,
    ) -> Result<Self::Connection, TransportError> {
        let (local, remote) = MemoryConnection::pair();
        self.accepted.send(remote).map_err(|_| {
            TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("nothing is listening on {addr}"),
            ))
        })?;
        tracing::debug!(id = %local.id(), addr, "memory connection opened");
        Ok(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_delivers_in_both_directions() {
        let (a, b) = MemoryConnection::pair();

        a.send(b"ping").await.unwrap();
        b.send(b"pong").await.unwrap();

        assert_eq!(b.recv().await.unwrap(), Some(b"ping".to_vec()));
        assert_eq!(a.recv().await.unwrap(), Some(b"pong".to_vec()));
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_close_ends_peer_stream() {
        let (a, b) = MemoryConnection::pair();
        a.send(b"last").await.unwrap();
        a.close().await.unwrap();

        // Frames sent before the close are still delivered.
        assert_eq!(b.recv().await.unwrap(), Some(b"last".to_vec()));
        assert_eq!(b.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_after_close_returns_connection_closed() {
        let (a, _b) = MemoryConnection::pair();
        a.close().await.unwrap();

        let result = a.send(b"too late").await;
        assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
    }

    #[tokio::test]
    async fn test_send_to_dropped_peer_returns_connection_closed() {
        let (a, b) = MemoryConnection::pair();
        drop(b);

        let result = a.send(b"anyone?").await;
        assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
    }

    #[tokio::test]
    async fn test_connector_without_listener_fails() {
        let (connector, accepted) = MemoryConnector::new();
        drop(accepted);

        let result = connector.connect("memory").await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }
}
