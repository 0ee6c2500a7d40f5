//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Load builds and freeze them into shared state
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Mount caller-supplied static overrides per build
//! - Serve on a plain or TLS listener with graceful shutdown

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, MethodRouter};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::build::push::join_url_path;
use crate::build::{
    load_builds, BuildRegistry, FileCache, LoadOptions, RawTemplateFactory, TemplateFactory,
};
use crate::capability::{CachingClassifier, Classifier, UserAgentClassifier};
use crate::config::{load_project_config, ProjectConfig, ServerConfig};
use crate::http::dispatch;
use crate::http::headers::{always_push, PushPolicy};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::stopped;
use crate::lifecycle::startup::StartupError;
use crate::observability::metrics;

/// Distinct user agents remembered by the default classifier.
const UA_CACHE_CAPACITY: usize = 10_000;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub builds: Arc<BuildRegistry>,
    pub files: Arc<FileCache>,
    pub classifier: Arc<dyn Classifier>,
    /// Version prefix, e.g. `/static/`.
    pub version: Arc<str>,
    pub service_worker: Arc<str>,
    pub push_policy: Option<PushPolicy>,
    pub static_files: ServeDir,
}

/// Options for [`PrplServer`] beyond the config file.
pub struct PrplServerBuilder {
    config: ServerConfig,
    project: Option<ProjectConfig>,
    classifier: Option<Arc<dyn Classifier>>,
    template_factory: Arc<dyn TemplateFactory>,
    push_policy: Option<PushPolicy>,
    static_handlers: Vec<(String, MethodRouter)>,
}

impl PrplServerBuilder {
    /// Use this project config instead of reading `config.project_config`.
    pub fn project(mut self, project: ProjectConfig) -> Self {
        self.project = Some(project);
        self
    }

    /// Replace the default user agent classifier.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Replace the raw passthrough template for entrypoints.
    pub fn route_template(mut self, factory: Arc<dyn TemplateFactory>) -> Self {
        self.template_factory = factory;
        self
    }

    /// Decide per request whether to push; overrides `push.enabled`.
    pub fn should_push(mut self, policy: PushPolicy) -> Self {
        self.push_policy = Some(policy);
        self
    }

    /// Serve `path` (relative to each build) with `handler` instead of the
    /// file on disk, e.g. a per-tenant `manifest.json`.
    pub fn static_handler(mut self, path: impl Into<String>, handler: MethodRouter) -> Self {
        self.static_handlers.push((path.into(), handler));
        self
    }

    /// Load builds and assemble the router.
    pub fn build(self) -> Result<PrplServer, StartupError> {
        let project = match self.project {
            Some(project) => project,
            None => load_project_config(&self.config.project_config)?,
        };

        let version = self.config.version_prefix();
        let loaded = load_builds(
            &LoadOptions {
                project: &project,
                root: &self.config.root,
                routes: &self.config.routes,
                version: &version,
                assets: &self.config.assets,
            },
            self.template_factory.as_ref(),
        )?;
        metrics::record_builds_loaded(loaded.registry.len());

        let classifier = self.classifier.unwrap_or_else(|| {
            Arc::new(CachingClassifier::new(UserAgentClassifier::new(), UA_CACHE_CAPACITY))
                as Arc<dyn Classifier>
        });
        let push_policy = self
            .push_policy
            .or_else(|| self.config.push.enabled.then(always_push));

        let state = AppState {
            builds: Arc::new(loaded.registry),
            files: Arc::new(loaded.files),
            classifier,
            version: Arc::from(version),
            service_worker: Arc::from(self.config.assets.service_worker.as_str()),
            push_policy,
            static_files: ServeDir::new(&self.config.root),
        };

        let router = build_router(&self.config, state.clone(), &self.static_handlers);
        Ok(PrplServer {
            router,
            config: self.config,
            state,
        })
    }
}

/// HTTP server for the application builds.
pub struct PrplServer {
    router: Router,
    config: ServerConfig,
    state: AppState,
}

impl PrplServer {
    pub fn builder(config: ServerConfig) -> PrplServerBuilder {
        PrplServerBuilder {
            config,
            project: None,
            classifier: None,
            template_factory: Arc::new(RawTemplateFactory),
            push_policy: None,
            static_handlers: Vec::new(),
        }
    }

    /// Create a server with default options.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        Self::builder(config).build()
    }

    /// The assembled router, for embedding or testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve plain HTTP until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            builds = self.state.builds.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(stopped(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS (HTTP/1.1 and HTTP/2 via ALPN) until shutdown is signalled.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            builds = self.state.builds.len(),
            "HTTPS server starting"
        );

        let handle = axum_server::Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_secs);
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            stopped(shutdown).await;
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
fn build_router(
    config: &ServerConfig,
    state: AppState,
    static_handlers: &[(String, MethodRouter)],
) -> Router {
    let version = state.version.clone();
    let builds = state.builds.clone();

    let mut router = Router::new();
    for build in builds.iter() {
        router = router.route(
            &format!("{}{}", version, build.entrypoint()),
            get(dispatch::entrypoint),
        );
    }

    let mut router = router
        .route(&format!("{}{{*path}}", version), get(dispatch::static_asset))
        .fallback(dispatch::entrypoint)
        .with_state(state);

    let mut mounted = HashSet::new();
    for build in builds.iter() {
        mounted.insert(format!("{}{}", version, build.entrypoint()));
    }
    for build in builds.iter() {
        let build_prefix = format!("{}{}", version, build.name());
        for (path, handler) in static_handlers {
            let route = join_url_path(&build_prefix, path);
            if !mounted.insert(route.clone()) {
                tracing::warn!(route = %route, "Static handler conflicts with an existing route; skipping");
                continue;
            }
            tracing::debug!(route = %route, build = %build.name(), "Static handler mounted");
            router = router.route(&route, handler.clone());
        }
    }

    router
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
        .layer(TraceLayer::new_for_http())
}
