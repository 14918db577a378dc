//! p2px node entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Trade and escrow coordination node
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via P2PX_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI arg > P2PX_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("P2PX_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = p2px_node::AppConfig::from_file(&config_path)?;
    p2px_telemetry::init_logging(config.telemetry.log_filter.as_deref())?;

    info!("Starting p2px node v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        custody_url = %config.escrow.custody_url,
        "Configuration loaded"
    );

    let app = p2px_node::Application::new(config)?;
    app.run().await?;

    Ok(())
}
