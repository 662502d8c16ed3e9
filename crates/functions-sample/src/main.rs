//! Local functions server for the sample module
//!
//! Serves every function in [`functions_sample::symbols`] at `/<name>` on
//! `PORT`, plus the admin API on `ADMIN_PORT` when it is set.

use clap::Parser;
use functions_runtime::{Registry, Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "functions-sample")]
#[command(about = "Serve the sample functions locally", long_about = None)]
#[command(version)]
struct Cli {
    /// Function listener port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Admin listener port (overrides ADMIN_PORT)
    #[arg(long)]
    admin_port: Option<u16>,

    /// Log level
    #[arg(long, env = "FUNCTIONS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "FUNCTIONS_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    if let Some(port) = cli.admin_port {
        config = config.with_admin_port(port);
    }

    let registry = Registry::from_symbols(functions_sample::symbols());
    tracing::info!(functions = registry.len(), "Starting functions server");

    Server::new(registry, config)?.serve().await?;
    Ok(())
}
