//! Project file (`polymer.json`) schema.
//!
//! Only the fields the server needs are read; everything else in the file
//! belongs to the front-end tooling and is ignored.

use serde::{Deserialize, Serialize};

/// Entrypoint file name used when the project does not set one.
pub const DEFAULT_ENTRYPOINT: &str = "index.html";

/// Front-end project configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Entrypoint document name inside each build.
    pub entrypoint: Option<String>,

    /// App shell document, relative to a build.
    pub shell: String,

    /// Declared builds, in priority tie-break order.
    pub builds: Vec<BuildConfig>,
}

impl ProjectConfig {
    pub fn entrypoint(&self) -> &str {
        match self.entrypoint.as_deref() {
            Some(e) if !e.is_empty() => e,
            _ => DEFAULT_ENTRYPOINT,
        }
    }
}

/// A declared build variant.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default)]
    pub name: String,

    /// Capability tokens a browser needs for this build.
    #[serde(default)]
    pub browser_capabilities: Vec<String>,
}
