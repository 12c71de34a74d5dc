#![forbid(unsafe_code)]
//! GYDSchain node: block producers plus the HTTP/JSON-RPC server

use clap::Parser;
use gydschain::config::{load_config, DEFAULT_CONFIG_PATH};
use gydschain::node::Node;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gyds-node", version, about = "Run a GYDSchain node")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// HTTP port; overrides both the config file and `PORT`
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(Some(&cli.config))?;
    if let Some(port) = cli.port {
        config.node.api_port = port;
    }

    let node = Arc::new(Node::new(config)?);
    node.run().await
}
