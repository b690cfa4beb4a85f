//! HTTP liveness endpoint.
//!
//! Hosting platforms that expect a web process ping `GET /` to decide
//! whether the bot is alive. The route never touches session state.

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::HealthSettings;
use crate::AfkError;

/// Body returned by `GET /`.
pub const ALIVE: &str = "Bot has arrived";

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    ALIVE
}

/// Binds `addr` and serves the liveness route until the process exits.
pub async fn serve(addr: &str) -> Result<(), AfkError> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "liveness endpoint listening");
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Starts the endpoint in the background if enabled.
///
/// A failure (usually the port being taken) is logged and otherwise
/// ignored: the bot keeps running without it.
pub fn spawn(settings: &HealthSettings) -> Option<JoinHandle<()>> {
    if !settings.enabled {
        return None;
    }
    let addr = settings.bind.clone();
    Some(tokio::spawn(async move {
        if let Err(e) = serve(&addr).await {
            tracing::error!(%addr, error = %e, "liveness endpoint failed");
        }
    }))
}
