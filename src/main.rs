//! User service HTTP gateway.
//!
//! # Startup
//!
//! ```text
//! CLI args → config (file or defaults) → mode override → validate
//!     → logging, metrics → route assembly → bind → serve until signal
//! ```
//!
//! Every step before `bind` is fatal on error.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use user_gateway::config::{load_config, validate_config, AppConfig, ConfigError, RunMode};
use user_gateway::http::HttpServer;
use user_gateway::lifecycle::{signals, Shutdown};
use user_gateway::observability::{logging, metrics};
use user_gateway::routing::Collaborators;

#[derive(Parser)]
#[command(name = "user-gateway")]
#[command(about = "HTTP entry point for the user service", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured run mode.
    #[arg(short, long)]
    mode: Option<RunMode>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.app.mode = mode;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init(&config.observability);

    tracing::info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        mode = %config.app.mode,
        bind_address = %config.listener.bind_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let collaborators = Collaborators::from_config(&config);
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, collaborators, Vec::new()).map_err(|e| {
        tracing::error!(error = %e, "Route registration failed");
        e
    })?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
