//! Build registry construction and lookup.
//!
//! # Responsibilities
//! - Plan builds from the project config (names, requirements, directories)
//! - Load each build's entrypoint and push manifest from disk
//! - Order builds so the first match is the most capable one
//! - Pick a build for a client capability mask
//!
//! # Design Decisions
//! - Ordering: more required features first, then declaration order
//! - A build whose entrypoint cannot be loaded is excluded, not kept half-built
//! - Startup fails only when no build at all can be served

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use thiserror::Error;
use walkdir::WalkDir;

use crate::build::files::{CachedFile, FileCache};
use crate::build::manifest::read_manifest_or_empty;
use crate::build::push::{PreloadLink, PushCompiler, PushHeaders, RouteTable};
use crate::build::template::{Template, TemplateFactory};
use crate::capability::Capability;
use crate::config::{AssetsConfig, ProjectConfig};

/// Errors that exclude a single build at startup.
#[derive(Debug, Error)]
pub enum BuildLoadError {
    #[error("failed to scan build directory {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read entrypoint {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("entrypoint {entrypoint} not found under {directory:?}")]
    MissingEntrypoint {
        entrypoint: String,
        directory: PathBuf,
    },
}

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no servable builds: every configured build failed to load")]
    NoServableBuilds,
}

/// What to build, before anything is read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub name: String,
    pub config_order: usize,
    pub requirements: Capability,
    /// Entrypoint path relative to the server root, `/`-separated.
    pub entrypoint: String,
    pub directory: PathBuf,
}

/// Translate the project config into build plans, in declaration order.
///
/// With no declared builds the result is a single unnamed build rooted at
/// `root` with no requirements.
pub fn plan_builds(project: &ProjectConfig, root: &Path) -> Vec<BuildPlan> {
    let entrypoint = project.entrypoint();

    if project.builds.is_empty() {
        tracing::warn!("No builds configured; serving the server root as a single build");
        return vec![BuildPlan {
            name: String::new(),
            config_order: 0,
            requirements: Capability::NONE,
            entrypoint: entrypoint.to_string(),
            directory: root.to_path_buf(),
        }];
    }

    let mut plans: Vec<BuildPlan> = Vec::with_capacity(project.builds.len());
    for (i, build) in project.builds.iter().enumerate() {
        if build.name.is_empty() {
            tracing::warn!(offset = i, "Build has no name; skipping");
            continue;
        }
        if build.name.contains(['{', '}', '*']) || build.name.starts_with('/') {
            tracing::warn!(offset = i, name = %build.name, "Build name is not a valid path segment; skipping");
            continue;
        }
        if plans.iter().any(|p| p.name == build.name) {
            tracing::warn!(offset = i, name = %build.name, "Duplicate build name; skipping");
            continue;
        }

        plans.push(BuildPlan {
            name: build.name.clone(),
            config_order: i,
            requirements: Capability::from_tokens(&build.browser_capabilities),
            entrypoint: format!("{}/{}", build.name, entrypoint),
            directory: root.join(&build.name),
        });
    }
    plans
}

/// One servable build variant.
pub struct Build {
    name: String,
    config_order: usize,
    requirements: Capability,
    entrypoint: String,
    template: Arc<dyn Template>,
    push_headers: PushHeaders,
}

impl Build {
    pub fn new(plan: BuildPlan, template: Arc<dyn Template>, push_headers: PushHeaders) -> Self {
        Self {
            name: plan.name,
            config_order: plan.config_order,
            requirements: plan.requirements,
            entrypoint: plan.entrypoint,
            template,
            push_headers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config_order(&self) -> usize {
        self.config_order
    }

    pub fn requirements(&self) -> Capability {
        self.requirements
    }

    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    pub fn template(&self) -> &dyn Template {
        self.template.as_ref()
    }

    pub fn push_headers(&self) -> &PushHeaders {
        &self.push_headers
    }

    /// Returns true if a client with these features can run this build.
    pub fn can_serve(&self, client: Capability) -> bool {
        client.contains(self.requirements)
    }

    /// Preload links for a request path, trying the path as given and then
    /// with the version prefix prepended.
    pub fn links_for(&self, path: &str, version: &str) -> Option<&[PreloadLink]> {
        self.push_headers
            .get(path)
            .or_else(|| self.push_headers.get(&format!("{}{}", version, path)))
            .map(Vec::as_slice)
    }
}

impl fmt::Debug for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Build")
            .field("name", &self.name)
            .field("config_order", &self.config_order)
            .field("requirements", &self.requirements)
            .field("entrypoint", &self.entrypoint)
            .field("push_headers", &self.push_headers.len())
            .finish_non_exhaustive()
    }
}

fn by_priority(a: &Build, b: &Build) -> Ordering {
    b.requirements
        .size()
        .cmp(&a.requirements.size())
        .then(a.config_order.cmp(&b.config_order))
}

/// Builds ordered by priority. Immutable after construction.
#[derive(Debug)]
pub struct BuildRegistry {
    builds: Vec<Build>,
}

impl BuildRegistry {
    pub fn new(mut builds: Vec<Build>) -> Self {
        builds.sort_by(by_priority);

        let registry = Self { builds };
        if !registry.has_fallback() {
            tracing::warn!(
                "All builds have a capability requirement. Some browsers will display an error. Consider a fallback build."
            );
        }
        registry
    }

    /// First build, in priority order, that the client can run.
    pub fn find_build(&self, client: Capability) -> Option<&Build> {
        self.builds.iter().find(|build| build.can_serve(client))
    }

    /// Returns true if some build has no requirements.
    pub fn has_fallback(&self) -> bool {
        self.builds.iter().any(|b| b.requirements.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Build> {
        self.builds.iter()
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

/// Inputs for [`load_builds`].
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions<'a> {
    pub project: &'a ProjectConfig,
    pub root: &'a Path,
    pub routes: &'a RouteTable,
    /// Version prefix, e.g. `/static/`.
    pub version: &'a str,
    pub assets: &'a AssetsConfig,
}

/// Registry plus the entrypoint cache filled while loading it.
#[derive(Debug)]
pub struct LoadedBuilds {
    pub registry: BuildRegistry,
    pub files: FileCache,
}

/// Load every planned build from disk.
pub fn load_builds(
    options: &LoadOptions<'_>,
    factory: &dyn TemplateFactory,
) -> Result<LoadedBuilds, RegistryError> {
    let mut builds = Vec::new();
    let mut files = Vec::new();

    for plan in plan_builds(options.project, options.root) {
        let (key, file) = match scan_entrypoint(&plan, options.root, options.version) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(build = %plan.name, error = %e, "Excluding build");
                continue;
            }
        };

        let template = factory.create(&plan.entrypoint, file.data().clone(), file.modified());
        let manifest = read_manifest_or_empty(&plan.directory.join(&options.assets.push_manifest));
        let prefix = format!("{}{}/", options.version, plan.name);
        let push_headers = PushCompiler {
            prefix: &prefix,
            shell: options.project.shell.as_str(),
            loader: options.assets.loader.as_str(),
        }
        .compile(&manifest, options.routes);

        tracing::info!(
            build = %plan.name,
            requirements = %plan.requirements,
            entrypoint = %plan.entrypoint,
            push_paths = push_headers.len(),
            "Build loaded"
        );

        let directory_index = directory_key(&key);
        files.push((directory_index, file.clone()));
        files.push((key, file));
        builds.push(Build::new(plan, template, push_headers));
    }

    if builds.is_empty() {
        return Err(RegistryError::NoServableBuilds);
    }

    Ok(LoadedBuilds {
        registry: BuildRegistry::new(builds),
        files: files.into_iter().collect(),
    })
}

/// Walk the build directory for its entrypoint, then read and rewrite it.
fn scan_entrypoint(
    plan: &BuildPlan,
    root: &Path,
    version: &str,
) -> Result<(String, CachedFile), BuildLoadError> {
    for entry in WalkDir::new(&plan.directory) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(BuildLoadError::Walk {
                    path: plan.directory.clone(),
                    source,
                });
            }
            Err(e) => {
                tracing::warn!(build = %plan.name, error = %e, "Skipping unreadable path in build directory");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative) = relative_url_path(entry.path(), root) else {
            continue;
        };
        if relative != plan.entrypoint {
            continue;
        }

        let read_err = |source| BuildLoadError::Read {
            path: entry.path().to_path_buf(),
            source,
        };
        let data = fs::read(entry.path()).map_err(read_err)?;
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or_else(SystemTime::now);

        let data = rewrite_base_href(&data, &plan.name, version);
        return Ok((relative, CachedFile::new(Bytes::from(data), modified)));
    }

    Err(BuildLoadError::MissingEntrypoint {
        entrypoint: plan.entrypoint.clone(),
        directory: plan.directory.clone(),
    })
}

/// Cache key under which a directory request finds its index document.
fn directory_key(entrypoint: &str) -> String {
    match entrypoint.rsplit_once('/') {
        Some((dir, _)) => format!("{}/", dir),
        None => String::new(),
    }
}

fn relative_url_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(segments?.join("/"))
}

/// Point the build's `<base href>` at its versioned location. Only the first
/// occurrence is replaced.
pub fn rewrite_base_href(data: &[u8], name: &str, version: &str) -> Vec<u8> {
    let needle = format!(r#"<base href="/{}/">"#, name);
    let replacement = format!(r#"<base href="{}{}/">"#, version, name);

    match data
        .windows(needle.len())
        .position(|window| window == needle.as_bytes())
    {
        Some(at) => {
            let mut out = Vec::with_capacity(data.len() + replacement.len());
            out.extend_from_slice(&data[..at]);
            out.extend_from_slice(replacement.as_bytes());
            out.extend_from_slice(&data[at + needle.len()..]);
            out
        }
        None => data.to_vec(),
    }
}
