//! The reconnect loop: one session at a time, forever if configured.
//!
//! ```text
//! connect -> Join -> Session::run -> ended -> auto-reconnect?
//!    ^                                          | yes: sleep(delay)
//!    +------------------------------------------+
//! ```
//!
//! The loop awaits each session to completion before sleeping, so a
//! session that reports its end twice can't schedule two replacements.
//! A failed connect counts as a session end and goes through the same
//! fixed delay. There is no backoff and no attempt limit.

use std::sync::Arc;

use afkbot_protocol::Codec;
use afkbot_transport::Connector;

use crate::config::Settings;
use crate::session::{Session, SessionEnd};
use crate::world::WorldLink;

pub struct Supervisor<K: Connector, C: Codec + Clone> {
    connector: K,
    codec: C,
    settings: Arc<Settings>,
}

impl<K: Connector, C: Codec + Clone> Supervisor<K, C> {
    pub fn new(connector: K, codec: C, settings: Settings) -> Self {
        Self {
            connector,
            codec,
            settings: Arc::new(settings),
        }
    }

    /// Runs sessions until one ends with auto-reconnect disabled.
    ///
    /// Returns how that last session ended.
    pub async fn run(&self) -> SessionEnd {
        let reconnect = self.settings.utils.auto_reconnect;
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let end = self.run_session(attempt).await;

            if !reconnect.enabled {
                tracing::info!(?end, "auto-reconnect disabled, stopping");
                return end;
            }

            tracing::info!(
                attempt,
                delay_ms = reconnect.delay,
                "reconnecting after delay"
            );
            tokio::time::sleep(reconnect.delay()).await;
        }
    }

    /// Connects, logs in and runs one session to completion.
    async fn run_session(&self, attempt: u64) -> SessionEnd {
        let addr = self.settings.gateway_addr();

        let conn = match self.connector.connect(&addr).await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::info!(attempt, %addr, error = %e, "connect failed");
                return SessionEnd::Failed(e.to_string());
            }
        };

        let link = WorldLink::new(conn, self.codec.clone());
        if let Err(e) = link.send(&self.settings.join_command()).await {
            tracing::info!(conn = %link.id(), error = %e, "join failed");
            let _ = link.close().await;
            return SessionEnd::Failed(e.to_string());
        }

        tracing::info!(
            conn = %link.id(),
            attempt,
            %addr,
            username = %self.settings.bot_account.username,
            "connected"
        );

        Session::new(link, Arc::clone(&self.settings)).run().await
    }
}
