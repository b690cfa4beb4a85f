//! A typed view of one world connection.
//!
//! The transport moves bytes and the codec turns them into values;
//! [`WorldLink`] glues the two so the session only ever sees
//! [`WorldEvent`]s coming in and [`WorldCommand`]s going out.

use afkbot_protocol::{Codec, WorldCommand, WorldEvent};
use afkbot_transport::{Connection, ConnectionId};

use crate::AfkError;

pub struct WorldLink<K: Connection, C: Codec> {
    conn: K,
    codec: C,
}

impl<K: Connection, C: Codec> WorldLink<K, C> {
    pub fn new(conn: K, codec: C) -> Self {
        Self { conn, codec }
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Encodes and sends one command.
    pub async fn send(&self, command: &WorldCommand) -> Result<(), AfkError> {
        let bytes = self.codec.encode(command)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    /// Receives the next event. `Ok(None)` means the connection closed.
    ///
    /// Frames that don't decode are logged and skipped; one bad frame
    /// shouldn't end the session. Cancel-safe, like the connection's
    /// `recv`.
    pub async fn recv(&self) -> Result<Option<WorldEvent>, AfkError> {
        loop {
            let Some(data) = self.conn.recv().await? else {
                return Ok(None);
            };
            match self.codec.decode(&data) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    tracing::debug!(
                        conn = %self.conn.id(),
                        error = %e,
                        "failed to decode world event, skipping"
                    );
                }
            }
        }
    }

    /// Closes the underlying connection.
    pub async fn close(&self) -> Result<(), AfkError> {
        self.conn.close().await?;
        Ok(())
    }
}
