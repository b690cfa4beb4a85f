use std::path::PathBuf;

use afkbot::health;
use afkbot::prelude::*;
use clap::Parser;

#[derive(Parser)]
#[command(name = "afkbot", about = "Keeps an account idling in a game world")]
#[command(version)]
struct Cli {
    /// Path to the settings file
    #[arg(short, long, default_value = "settings.json")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), AfkError> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let settings = Settings::load(&cli.config)?;
    settings.validate()?;
    tracing::info!(config = %cli.config.display(), "settings loaded");

    let _health = health::spawn(&settings.health);

    let supervisor = Supervisor::new(WebSocketConnector, JsonCodec, settings);
    let end = supervisor.run().await;
    tracing::info!(?end, "bot stopped");
    Ok(())
}
