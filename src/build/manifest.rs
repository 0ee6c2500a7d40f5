//! Push manifest reading.
//!
//! A push manifest maps each served file to the assets it depends on:
//!
//! ```json
//! { "index.html": { "app.js": { "type": "script" } } }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dependency descriptor for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetDescriptor {
    /// Preload destination (`script`, `style`, `document`, `image`, `font`, ...).
    #[serde(rename = "type")]
    pub kind: String,
}

/// Dependencies of a single served file, in manifest order.
pub type AssetDependencies = IndexMap<String, AssetDescriptor>;

/// Served file → dependencies, in manifest order.
pub type AssetManifest = IndexMap<String, AssetDependencies>;

/// Errors reading a push manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read push manifest {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed push manifest {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a push manifest. A missing file is an empty manifest.
pub fn read_manifest(path: &Path) -> Result<AssetManifest, ManifestError> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(AssetManifest::new()),
        Err(source) => {
            return Err(ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a push manifest, logging any failure and falling back to empty.
pub fn read_manifest_or_empty(path: &Path) -> AssetManifest {
    match read_manifest(path) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring push manifest");
            AssetManifest::new()
        }
    }
}
