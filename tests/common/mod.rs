//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request};
use axum::response::Response;
use tempfile::TempDir;

use prpl_server::capability::Classifier;
use prpl_server::config::{BuildConfig, ProjectConfig, ServerConfig};
use prpl_server::http::{PushError, Pusher};
use prpl_server::Capability;

pub const MODERN_UA: &str = "modern-browser";
pub const LEGACY_UA: &str = "legacy-browser";

pub const MODERN_MANIFEST: &str = r#"{
    "app.js": {
        "lib.js": { "type": "script" }
    },
    "index.html": {
        "app.js": { "type": "script" }
    },
    "src/shell.html": {
        "src/shared.js": { "type": "script" },
        "lib.js": { "type": "script" }
    },
    "src/home.html": {
        "src/home.js": { "type": "script" },
        "lib.js": { "type": "script" }
    }
}"#;

/// A server root on disk, removed when dropped.
pub struct Site {
    pub dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> &Self {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }

    /// Server config rooted at this site with one app route.
    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.root = self.root().to_path_buf();
        config.project_config = self.root().join("polymer.json");
        config
            .routes
            .insert("/home".to_string(), "src/home.html".to_string());
        config
    }
}

/// A `modern` build needing es2015 and push, plus a `legacy` fallback.
pub fn modern_and_legacy() -> Site {
    let site = Site::new();
    site.write(
        "modern/index.html",
        r#"<html><head><base href="/modern/"></head><body>modern</body></html>"#,
    )
    .write("modern/push-manifest.json", MODERN_MANIFEST)
    .write("modern/app.js", "console.log('modern');")
    .write("modern/service-worker.js", "self.addEventListener('fetch', () => {});")
    .write(
        "legacy/index.html",
        r#"<html><head><base href="/legacy/"></head><body>legacy</body></html>"#,
    )
    .write("legacy/app.js", "var legacy = true;");
    site
}

pub fn modern_and_legacy_project() -> ProjectConfig {
    ProjectConfig {
        entrypoint: None,
        shell: "src/shell.html".to_string(),
        builds: vec![
            BuildConfig {
                name: "legacy".to_string(),
                browser_capabilities: vec![],
            },
            BuildConfig {
                name: "modern".to_string(),
                browser_capabilities: vec!["es2015".to_string(), "push".to_string()],
            },
        ],
    }
}

/// Classifies [`MODERN_UA`] as es2015 + push and everything else as nothing.
pub fn fake_classifier() -> Arc<dyn Classifier> {
    Arc::new(|user_agent: &str| {
        if user_agent == MODERN_UA {
            Capability::ES2015 | Capability::PUSH
        } else {
            Capability::NONE
        }
    })
}

pub fn get(path: &str, user_agent: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("user-agent", user_agent)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn links(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all("link")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Records every push instead of sending it.
#[derive(Default)]
pub struct RecordingPusher {
    pub pushed: Mutex<Vec<String>>,
}

impl Pusher for RecordingPusher {
    fn push(&self, target: &str, _headers: HeaderMap) -> Result<(), PushError> {
        self.pushed.lock().unwrap().push(target.to_string());
        Ok(())
    }
}
