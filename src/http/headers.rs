//! Response header policy.
//!
//! # Responsibilities
//! - Cache-Control policies for entrypoints, versioned assets and the service worker
//! - `Link: rel=preload` headers for a build's compiled push links
//! - HTTP/2 push of the same links when the transport offers it
//!
//! # Design Decisions
//! - Link headers are always sent; push is an optional extra
//! - Push capability travels as a request extension set by the transport
//! - Push failures are logged and never fail the request

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use thiserror::Error;

use crate::build::PreloadLink;

/// Versioned, content-addressed assets.
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
/// Entrypoint documents; always revalidate.
pub const CACHE_NEVER: &str = "public, max-age=0";
/// The service worker; never cached by shared caches.
pub const CACHE_NEVER_PRIVATE: &str = "private, max-age=0";

pub const SERVICE_WORKER_ALLOWED: HeaderName = HeaderName::from_static("service-worker-allowed");

/// Set caching headers for a request under the version prefix.
pub fn apply_static_cache_policy(headers: &mut HeaderMap, path: &str, service_worker: &str) {
    if !service_worker.is_empty() && path.ends_with(service_worker) {
        headers.insert(SERVICE_WORKER_ALLOWED, HeaderValue::from_static("/"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_NEVER_PRIVATE));
    } else {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_IMMUTABLE));
    }
}

/// Append one `Link` header per preload link, in order.
pub fn append_link_headers(headers: &mut HeaderMap, links: &[PreloadLink]) {
    for link in links {
        match HeaderValue::from_str(&link.to_string()) {
            Ok(value) => {
                headers.append(header::LINK, value);
            }
            Err(_) => {
                tracing::warn!(target_path = %link.target(), "Preload link is not a valid header value");
            }
        }
    }
}

/// A transport-level push failure.
#[derive(Debug, Error)]
#[error("push of {target} failed: {reason}")]
pub struct PushError {
    pub target: String,
    pub reason: String,
}

/// Server push side channel for one connection.
pub trait Pusher: Send + Sync {
    /// Push `target` with `headers` attached to the pushed response.
    fn push(&self, target: &str, headers: HeaderMap) -> Result<(), PushError>;
}

/// Request extension inserted by transports that can push.
#[derive(Clone)]
pub struct PushHandle(Arc<dyn Pusher>);

impl PushHandle {
    pub fn new(pusher: Arc<dyn Pusher>) -> Self {
        Self(pusher)
    }

    pub fn pusher(&self) -> &dyn Pusher {
        self.0.as_ref()
    }
}

impl fmt::Debug for PushHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PushHandle").finish_non_exhaustive()
    }
}

/// Decides per request whether to push linked resources.
pub type PushPolicy = Arc<dyn Fn(&Request<Body>) -> bool + Send + Sync>;

/// Policy that pushes on every request.
pub fn always_push() -> PushPolicy {
    Arc::new(|_: &Request<Body>| true)
}

/// Push every link through `pusher`. Returns how many pushes succeeded.
pub fn push_links(pusher: &dyn Pusher, links: &[PreloadLink]) -> usize {
    let mut pushed = 0;
    for link in links {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_IMMUTABLE));
        match pusher.push(link.target(), headers) {
            Ok(()) => pushed += 1,
            Err(e) => tracing::debug!(error = %e, "Server push skipped"),
        }
    }
    pushed
}

/// Apply a build's links for one request: push when the transport and policy
/// allow it, then append the `Link` headers.
pub fn apply_links(
    response_headers: &mut HeaderMap,
    links: &[PreloadLink],
    request: &Request<Body>,
    policy: Option<&PushPolicy>,
) {
    if let Some(handle) = request.extensions().get::<PushHandle>() {
        if policy.is_some_and(|should_push| should_push(request)) {
            let pushed = push_links(handle.pusher(), links);
            tracing::debug!(pushed, total = links.len(), "Pushed preload links");
        }
    }

    append_link_headers(response_headers, links);
}
