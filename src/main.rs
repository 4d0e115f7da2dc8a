//! stencil: configuration aggregation service.
//!
//! Merges configuration values from an ordered list of data sources into one
//! immutable snapshot at startup and serves it, together with the raw
//! template bodies held by the template sources, over a small read-only
//! JSON status API.
//!
//! # Architecture Overview
//!
//! ```text
//!   stencil.toml ──▶ config ──▶ lifecycle::startup
//!                                   │
//!              ┌────────────────────┼─────────────────────┐
//!              ▼                    ▼                     ▼
//!        data sources        template sources       aggregate
//!   inline/env/xml/consul    directory/consul    (ordered merge)
//!              │                    │                     │
//!              └──────────┬─────────┘                     │
//!                         ▼                               ▼
//!   Client ──▶ net::Listener ──▶ api::server ──▶ routing ──▶ handlers
//!                                                   (snapshot + live templates)
//! ```

use std::path::PathBuf;

use clap::Parser;

use stencil::api::{ApiServer, AppState};
use stencil::config::load_config_for;
use stencil::lifecycle::{bootstrap, signals, Shutdown};
use stencil::net::Listener;
use stencil::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "stencil")]
#[command(about = "Aggregate configuration values and serve them over a status API", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "stencil.toml")]
    config: PathBuf,

    /// Override the configured environment
    #[arg(short, long)]
    environment: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config_for(&args.config, args.environment.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        environment = %config.environment,
        "stencil starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let booted = match bootstrap(&config).await {
        Ok(booted) => booted,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !config.api.enabled {
        tracing::info!(
            templates = booted.snapshot.template_names().count(),
            "API disabled, exiting after aggregation"
        );
        return Ok(());
    }

    let listener = Listener::bind(&config.api).await?;
    let shutdown = Shutdown::new();
    let signal_task = signals::spawn_signal_handler(shutdown.clone());

    let server = ApiServer::new(config.api.clone(), AppState::new(booted.snapshot, booted.templates));
    server.run(listener, shutdown.subscribe()).await?;
    signal_task.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
