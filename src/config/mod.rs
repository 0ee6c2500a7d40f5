//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server config (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! project file (polymer.json)
//!     → loader.rs
//!     → ProjectConfig (entrypoint, shell, builds)
//!     → build::registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod project;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_project_config, ConfigError};
pub use project::{BuildConfig, ProjectConfig};
pub use schema::{
    AssetsConfig, ListenerConfig, LogFormat, ObservabilityConfig, PushConfig, ServerConfig,
    TimeoutConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
