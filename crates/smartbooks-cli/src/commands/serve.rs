//! Serve command - run the web interface.

use std::path::Path;

use clap::Args;
use console::style;

use super::load_config;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

pub async fn run(args: ServeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    println!(
        "{} Serving SmartBooks on http://{}:{}",
        style("ℹ").blue(),
        host,
        port
    );

    smartbooks_web::serve(&config, &host, port).await
}
