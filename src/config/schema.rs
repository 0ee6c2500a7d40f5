//! Configuration schema definitions.
//!
//! This module defines the server configuration structure.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::build::RouteTable;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Server root; each build lives in a subdirectory named after it.
    pub root: PathBuf,

    /// Version segment for static assets (`static` → `/static/`).
    pub version: String,

    /// Path to the project file declaring builds (`polymer.json`).
    pub project_config: PathBuf,

    /// Route pattern → fragment document, in declaration order.
    pub routes: RouteTable,

    /// Well-known asset paths.
    pub assets: AssetsConfig,

    /// HTTP/2 push settings.
    pub push: PushConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            root: PathBuf::from("."),
            version: "static".to_string(),
            project_config: PathBuf::from("polymer.json"),
            routes: RouteTable::new(),
            assets: AssetsConfig::default(),
            push: PushConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServerConfig {
    /// The version as a URL prefix, e.g. `/static/`.
    pub fn version_prefix(&self) -> String {
        format!("/{}/", self.version.trim_matches('/'))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Paths of assets the server treats specially, relative to a build.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Web components loader, preloaded first on every route.
    pub loader: String,

    /// Service worker file name; gets a broadened scope and no caching.
    pub service_worker: String,

    /// Per-build push manifest file name.
    pub push_manifest: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            loader: "bower_components/webcomponentsjs/webcomponents-loader.js".to_string(),
            service_worker: "service-worker.js".to_string(),
            push_manifest: "push-manifest.json".to_string(),
        }
    }
}

/// HTTP/2 push configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    /// Push linked resources when the transport allows it.
    /// `Link` headers are sent either way.
    pub enabled: bool,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
