//! Entrypoint rendering.
//!
//! # Design Decisions
//! - Each build owns one template made from its cached entrypoint bytes
//! - The factory is injectable; the default serves the bytes unchanged

use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use bytes::Bytes;

use crate::http::content::{serve_content, TEXT_HTML};

/// Produces the response body for an entrypoint request.
pub trait Template: Send + Sync {
    fn render(&self, request: &Request<Body>) -> Response;
}

/// Creates a template for a build from its entrypoint document.
pub trait TemplateFactory: Send + Sync {
    /// `entrypoint` is the root-relative path, `data` the base-href-rewritten
    /// bytes.
    fn create(&self, entrypoint: &str, data: Bytes, modified: SystemTime) -> Arc<dyn Template>;
}

impl<F> TemplateFactory for F
where
    F: Fn(&str, Bytes, SystemTime) -> Arc<dyn Template> + Send + Sync,
{
    fn create(&self, entrypoint: &str, data: Bytes, modified: SystemTime) -> Arc<dyn Template> {
        self(entrypoint, data, modified)
    }
}

/// Serves the entrypoint bytes as-is.
#[derive(Debug, Clone)]
pub struct RawTemplate {
    data: Bytes,
    modified: SystemTime,
}

impl RawTemplate {
    pub fn new(data: Bytes, modified: SystemTime) -> Self {
        Self { data, modified }
    }
}

impl Template for RawTemplate {
    fn render(&self, request: &Request<Body>) -> Response {
        serve_content(request.headers(), &self.data, self.modified, TEXT_HTML)
    }
}

/// Default factory producing [`RawTemplate`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTemplateFactory;

impl TemplateFactory for RawTemplateFactory {
    fn create(&self, _entrypoint: &str, data: Bytes, modified: SystemTime) -> Arc<dyn Template> {
        Arc::new(RawTemplate::new(data, modified))
    }
}
