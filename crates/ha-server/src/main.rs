//! HomeAsisstan server binary

use anyhow::Result;
use clap::Parser;
use ha_effects::{RealRandomHandler, RealTimeHandler};
use ha_server::{logging::init_logging, ServerConfig};
use ha_store::MemoryStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "homeasisstan")]
#[command(about = "HomeAsisstan household management server", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "homeasisstan.toml", env = "HA_CONFIG")]
    config: PathBuf,

    /// Override `server.bind`
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(&cli.config)?;
    config.merge_with_env();
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    init_logging(config.logging.filter.as_deref(), cli.verbose);

    let random = Arc::new(RealRandomHandler::new());
    config.ensure_secret(random.as_ref()).await;

    ha_server::run(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(RealTimeHandler::new()),
        random,
    )
    .await?;
    Ok(())
}
