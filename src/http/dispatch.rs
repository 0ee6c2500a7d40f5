//! Request dispatch.
//!
//! # Responsibilities
//! - Classify the client and pick a build for every request
//! - Entrypoint requests: no-cache policy, preload links, template render
//! - Static requests: immutable or service-worker policy, preload links,
//!   cached entrypoint bytes or the on-disk file server
//!
//! # Design Decisions
//! - No build for the client is a 500 with a plain-text body
//! - Handlers only read shared state; nothing here takes a lock

use std::borrow::Cow;
use std::convert::Infallible;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tower::ServiceExt;

use crate::build::Build;
use crate::capability::Capability;
use crate::http::content::{serve_content, TEXT_HTML};
use crate::http::headers::{apply_links, apply_static_cache_policy, CACHE_NEVER};
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics::{self, RequestKind};

const UNSUPPORTED_BROWSER: &str = "This browser is not supported";

/// Percent-decode a request path. Push tables and the file cache are keyed
/// by decoded paths.
fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

fn client_capabilities(state: &AppState, request: &Request<Body>) -> Capability {
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    state.classifier.classify(user_agent)
}

fn select_build<'a>(
    state: &'a AppState,
    request: &Request<Body>,
    kind: RequestKind,
) -> Result<&'a Build, Response> {
    let client = client_capabilities(state, request);
    match state.builds.find_build(client) {
        Some(build) => {
            tracing::debug!(
                request_id = %request_id(request),
                client = %client,
                build = %build.name(),
                "Build selected"
            );
            Ok(build)
        }
        None => {
            tracing::warn!(
                request_id = %request_id(request),
                client = %client,
                path = %request.uri().path(),
                "No build supports this browser"
            );
            metrics::record_unsupported_browser(kind);
            Err((StatusCode::INTERNAL_SERVER_ERROR, UNSUPPORTED_BROWSER).into_response())
        }
    }
}

/// Serves a build's entrypoint document. Also the catch-all for app routes.
pub async fn entrypoint(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let build = match select_build(&state, &request, RequestKind::Entrypoint) {
        Ok(build) => build,
        Err(response) => return response,
    };

    let mut response = build.template().render(&request);
    response
        .headers_mut()
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static(CACHE_NEVER));

    let path = decode_path(request.uri().path()).into_owned();
    if let Some(links) = build.links_for(&path, &state.version) {
        apply_links(response.headers_mut(), links, &request, state.push_policy.as_ref());
    }

    metrics::record_request(
        RequestKind::Entrypoint,
        build.name(),
        response.status().as_u16(),
        start,
    );
    response
}

/// Serves everything under the version prefix.
pub async fn static_asset(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let encoded_path = request
        .uri()
        .path()
        .strip_prefix(&*state.version)
        .unwrap_or_else(|| request.uri().path())
        .to_string();
    let path = decode_path(&encoded_path).into_owned();

    let build = match select_build(&state, &request, RequestKind::Static) {
        Ok(build) => build,
        Err(response) => return response,
    };
    let build_name = build.name().to_string();

    let mut response_headers = HeaderMap::new();
    apply_static_cache_policy(&mut response_headers, &path, &state.service_worker);
    if let Some(links) = build.links_for(&path, &state.version) {
        apply_links(&mut response_headers, links, &request, state.push_policy.as_ref());
    }

    let mut response = match state.files.get(&path) {
        Some(file) => serve_content(
            request.headers(),
            file.data(),
            file.modified(),
            TEXT_HTML,
        ),
        None => serve_from_disk(&state, request, &encoded_path).await,
    };

    for (name, value) in response_headers.iter() {
        if *name == header::LINK {
            response.headers_mut().append(name, value.clone());
        } else {
            response.headers_mut().insert(name, value.clone());
        }
    }

    metrics::record_request(RequestKind::Static, &build_name, response.status().as_u16(), start);
    response
}

async fn serve_from_disk(state: &AppState, request: Request<Body>, path: &str) -> Response {
    let (mut parts, body) = request.into_parts();
    let mut uri = format!("/{}", path.trim_start_matches('/'));
    if let Some(query) = parts.uri.query() {
        uri.push('?');
        uri.push_str(query);
    }
    parts.uri = match uri.parse::<Uri>() {
        Ok(uri) => uri,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let result: Result<_, Infallible> = state
        .static_files
        .clone()
        .oneshot(Request::from_parts(parts, body))
        .await;
    let mut response = match result {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    // The file server only sees the stripped path; keep redirects (directory
    // trailing slash) under the version prefix.
    if response.status().is_redirection() {
        restore_version_prefix(response.headers_mut(), &state.version);
    }
    response
}

fn restore_version_prefix(headers: &mut HeaderMap, version: &str) {
    let Some(location) = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with('/') && !v.starts_with("//"))
    else {
        return;
    };

    let prefixed = format!("{}{}", version.trim_end_matches('/'), location);
    match HeaderValue::from_str(&prefixed) {
        Ok(value) => {
            headers.insert(header::LOCATION, value);
        }
        Err(_) => {
            tracing::warn!(location = %prefixed, "Redirect location is not a valid header value");
        }
    }
}
