//! Preload link compilation.
//!
//! # Responsibilities
//! - Turn a build's push manifest into per-file preload link lists
//! - Turn the route table into per-route lists (loader, shell, fragment + deps)
//! - Deduplicate route lists by canonical link string, first occurrence wins
//!
//! # Design Decisions
//! - Compiled once per build at startup; lookups at request time are a map hit
//! - Manifest entries are keyed by prefixed file path, routes by bare pattern
//! - A route pattern that equals a prefixed file path replaces that entry

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexMap;

use super::manifest::{AssetDependencies, AssetManifest};

/// Route pattern → fragment document backing it.
pub type RouteTable = IndexMap<String, String>;

/// Request path → preload links to announce for it.
pub type PushHeaders = HashMap<String, Vec<PreloadLink>>;

/// A single `rel=preload` hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreloadLink {
    target: String,
    kind: String,
}

impl PreloadLink {
    pub fn new(target: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: kind.into(),
        }
    }

    /// URL path of the resource.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Preload destination (`as=` value).
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for PreloadLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>; rel=preload; as={}", self.target, self.kind)
    }
}

/// Compiles the push header map for one build.
#[derive(Debug, Clone)]
pub struct PushCompiler<'a> {
    /// `<versionPrefix><buildName>/`
    pub prefix: &'a str,
    /// Shell document, relative to the build directory.
    pub shell: &'a str,
    /// Web components loader script, relative to the build directory.
    pub loader: &'a str,
}

impl PushCompiler<'_> {
    pub fn compile(&self, manifest: &AssetManifest, routes: &RouteTable) -> PushHeaders {
        let mut headers = PushHeaders::new();

        for (file, deps) in manifest {
            let links = deps
                .iter()
                .map(|(path, asset)| PreloadLink::new(join_url_path(self.prefix, path), &asset.kind))
                .collect();
            headers.insert(join_url_path(self.prefix, file), links);
        }

        for (route, fragment) in routes {
            let links = self.route_links(manifest, fragment);
            if headers.insert(route.clone(), links).is_some() {
                tracing::debug!(route = %route, "Route replaces push manifest entry");
            }
        }

        headers
    }

    fn route_links(&self, manifest: &AssetManifest, fragment: &str) -> Vec<PreloadLink> {
        let mut links = RouteLinks::default();

        links.push(PreloadLink::new(join_url_path(self.prefix, self.loader), "script"));
        links.push(PreloadLink::new(join_url_path(self.prefix, self.shell), "document"));
        links.extend_deps(self.prefix, manifest.get(self.shell));
        links.push(PreloadLink::new(join_url_path(self.prefix, fragment), "document"));
        links.extend_deps(self.prefix, manifest.get(fragment));

        links.links
    }
}

#[derive(Default)]
struct RouteLinks {
    seen: HashSet<String>,
    links: Vec<PreloadLink>,
}

impl RouteLinks {
    fn push(&mut self, link: PreloadLink) {
        if self.seen.insert(link.to_string()) {
            self.links.push(link);
        }
    }

    fn extend_deps(&mut self, prefix: &str, deps: Option<&AssetDependencies>) {
        for (path, asset) in deps.into_iter().flatten() {
            self.push(PreloadLink::new(join_url_path(prefix, path), &asset.kind));
        }
    }
}

/// Join URL path segments and normalize the result: repeated slashes
/// collapse, `.` segments drop, `..` pops. A trailing slash is not kept.
pub fn join_url_path(base: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut joined = String::with_capacity(base.len() + path.len() + 1);
    if base.starts_with('/') || (base.is_empty() && path.starts_with('/')) {
        joined.push('/');
    }
    joined.push_str(&segments.join("/"));
    joined
}
