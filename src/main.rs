//! PRPL application server (v1)
//!
//! Serves differential builds of a progressive web app with preload hints.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                   PRPL SERVER                     │
//!                          │                                                   │
//!   Client Request         │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ───────────────────────┼─▶│  http   │──▶│ dispatch │──▶│  capability  │   │
//!                          │  │ server  │   │          │   │  classifier  │   │
//!                          │  └─────────┘   └────┬─────┘   └──────┬───────┘   │
//!                          │                     │                │            │
//!                          │                     ▼                ▼            │
//!                          │              ┌────────────┐   ┌──────────────┐   │
//!                          │              │  headers   │◀──│build registry│   │
//!                          │              │Link / push │   │ (frozen)     │   │
//!                          │              └─────┬──────┘   └──────────────┘   │
//!                          │                    ▼                              │
//!   Client Response        │   ┌──────────────────────────────────────┐       │
//!   ◀──────────────────────┼───│ template │ cached bytes │ file server │       │
//!                          │   └──────────────────────────────────────┘       │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use prpl_server::config::{load_config, validate_config, ConfigError, ServerConfig};
use prpl_server::lifecycle;
use prpl_server::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "prpl-server")]
#[command(about = "Serve the best build of a progressive web app for each browser", long_about = None)]
struct Cli {
    /// Server configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing one subdirectory per build.
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(short, long)]
    bind: Option<String>,

    /// Version segment for static assets.
    #[arg(long)]
    static_version: Option<String>,

    /// Project file declaring builds.
    #[arg(long)]
    project: Option<PathBuf>,
}

fn resolve_config(cli: Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    if let Some(root) = cli.root {
        config.root = root;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(version) = cli.static_version {
        config.version = version;
    }
    if let Some(project) = cli.project {
        config.project_config = project;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(Cli::parse())?;

    init_logging(&config.observability)?;

    tracing::info!("prpl-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        root = ?config.root,
        version = %config.version_prefix(),
        tls = config.listener.tls.is_some(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    lifecycle::serve(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
