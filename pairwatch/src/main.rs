mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pairwatch_api::AppState;
use pairwatch_core::{
    bootstrap::{init_services, load_config},
    logging,
};

use server::PairWatchServer;

/// Two-person synchronized video watching server
#[derive(Debug, Parser)]
#[command(name = "pairwatch", version, about)]
struct Cli {
    /// YAML configuration file (falls back to PAIRWATCH_CONFIG_PATH, then ./config.yaml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load and validate configuration (fail fast on misconfigurations)
    let config = load_config(cli.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("Configuration loaded and validated successfully");
    info!("PairWatch server starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Initialize services, seeding the catalog and rooms
    let services = init_services(&config).await?;

    // 4. Wire the relay
    let state = AppState::new(services, &config);
    info!(
        max_per_room = state.rooms.capacity(),
        max_total = config.relay.max_total,
        "Relay initialized"
    );

    // 5. Serve until shutdown
    PairWatchServer::new(config, state).start().await
}
