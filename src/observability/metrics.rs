//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, unsupported browsers, builds)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `prpl_requests_total` (counter): requests by kind, build, status
//! - `prpl_request_duration_seconds` (histogram): latency by kind
//! - `prpl_unsupported_browser_total` (counter): requests no build could serve
//! - `prpl_builds_loaded` (gauge): builds in the registry
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality: build names, not paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Which handler served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Entrypoint,
    Static,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Entrypoint => "entrypoint",
            RequestKind::Static => "static",
        }
    }
}

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(kind: RequestKind, build: &str, status: u16, start: Instant) {
    counter!(
        "prpl_requests_total",
        "kind" => kind.as_str(),
        "build" => build.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("prpl_request_duration_seconds", "kind" => kind.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_unsupported_browser(kind: RequestKind) {
    counter!("prpl_unsupported_browser_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_builds_loaded(count: usize) {
    gauge!("prpl_builds_loaded").set(count as f64);
}
