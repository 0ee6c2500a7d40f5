//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Load the project file and every build
//! - Bind the plain or TLS listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: config, TLS and bind errors are fatal
//! - A single bad build is not fatal; having no servable build is
//! - Listener starts last (traffic only when builds are frozen)

use std::io;
use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::build::RegistryError;
use crate::config::{ConfigError, ServerConfig};
use crate::http::PrplServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid socket address {0:?}")]
    Address(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] io::Error),

    #[error("metrics exporter failed: {0}")]
    Metrics(#[from] BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn parse_addr(addr: &str) -> Result<SocketAddr, StartupError> {
    addr.parse()
        .map_err(|_| StartupError::Address(addr.to_string()))
}

/// Run the server described by `config` until a stop signal arrives.
pub async fn serve(config: ServerConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?)?;
    }

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();

    let server = PrplServer::new(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    match tls {
        Some(tls) => {
            let addr = parse_addr(&bind_address)?;
            let tls_config = load_tls_config(&tls).await.map_err(StartupError::Tls)?;
            server.run_tls(addr, tls_config, receiver).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, receiver).await?;
        }
    }

    Ok(())
}
