//! Build subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ProjectConfig + server root
//!     → registry.rs (plan builds, scan entrypoints)
//!     → manifest.rs (per-build push-manifest.json)
//!     → push.rs (compile path → preload links)
//!     → template.rs (renderable entrypoint per build)
//!     → BuildRegistry (sorted, frozen) + FileCache (frozen)
//!
//! Per request:
//!     Capability mask → BuildRegistry::find_build → Build
//!     request path → Build::links_for → preload links
//! ```
//!
//! # Design Decisions
//! - Everything here is built before the listener starts and never mutated
//! - Shared between requests via `Arc`, no locks on the request path

pub mod files;
pub mod manifest;
pub mod push;
pub mod registry;
pub mod template;

pub use files::{CachedFile, FileCache};
pub use manifest::{read_manifest, AssetDescriptor, AssetManifest, ManifestError};
pub use push::{PreloadLink, PushCompiler, PushHeaders, RouteTable};
pub use registry::{
    load_builds, plan_builds, Build, BuildLoadError, BuildPlan, BuildRegistry, LoadOptions,
    LoadedBuilds, RegistryError,
};
pub use template::{RawTemplate, RawTemplateFactory, Template, TemplateFactory};
