//! Application bootstrap: discovery, binding and the mount table.
//!
//! # Data Flow
//! ```text
//! Application::new(config)
//!     → statics mount (statics, other_statics, vendor_dir)
//! bind / bind_filtered(root, manifest)
//!     → engine.load_root (partials, layouts)
//!     → error pages (<root>/errors)
//!     → discovery::scan ∪ manifest sources
//!     → one sub-router per root (asset routes, handler routes)
//! into_router()
//!     → mounts tried in order; filters and pass-through skip a mount
//!     → catch-all 404
//! ```
//!
//! Binding completes before `into_router` returns, so no request can
//! reach a half-populated routing table.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware as axum_middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use thiserror::Error;
use tower::ServiceExt;

use super::binder::{self, BoundEndpoint};
use super::discovery::{self, Descriptor, HandlerKind};
use super::manifest::Manifest;
use super::matcher::Matcher;
use crate::config::{MvcConfig, ProjectConfig};
use crate::dispatch::{Endpoint, Middleware};
use crate::errors::{AppMetadata, ErrorKind, ErrorTemplates, Responder};
use crate::http::{unmatched_response, Unmatched};
use crate::mvc::{AssetSource, ControllerEndpoint, PageController, View};
use crate::observability::metrics;
use crate::view::{EngineOptions, TemplateCache, TemplateEngine, TemplateError};

/// Directory holding a root's error pages unless configured otherwise.
pub const DEFAULT_ERRORS_DIR: &str = "errors";

/// URL prefix of `other_statics` directories.
pub const OTHER_STATICS_PREFIX: &str = "/__";

/// URL of the vendor directory.
pub const VENDOR_URL: &str = "/__vendor";

#[derive(Debug, Error)]
pub enum BindError {
    #[error("project root {} is not a directory", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("discovery task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One handler as bound (or skipped) by [`Application::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub kind: HandlerKind,
    pub source: String,
    pub context: String,
    pub paths: Vec<String>,
    pub bound: bool,
}

/// What one call to [`Application::bind`] did.
#[derive(Debug, Clone, Default)]
pub struct BindReport {
    pub root: PathBuf,
    pub partials: usize,
    pub layouts: Vec<String>,
    pub error_pages: bool,
    pub routes: Vec<RouteEntry>,
}

struct Mount {
    label: String,
    filter: Option<Arc<dyn Matcher>>,
    router: Router,
}

struct MountTable {
    mounts: Vec<Mount>,
    responder: Arc<Responder>,
    catch_all_404: bool,
    max_body_bytes: usize,
}

/// A convention-bound MVC application.
pub struct Application {
    project: ProjectConfig,
    max_body_bytes: usize,
    metadata: Arc<AppMetadata>,
    engine: Arc<TemplateEngine>,
    middleware: Vec<Middleware>,
    mounts: Vec<Mount>,
    not_found: Arc<Responder>,
}

impl Application {
    pub fn new(config: &MvcConfig) -> Self {
        let project = config.project.clone();
        let metadata = Arc::new(config.app.metadata());
        let engine = Arc::new(TemplateEngine::new(
            EngineOptions {
                partials_dir: project.partials_dir.clone(),
                layouts_dir: project.layouts_dir.clone(),
                extra_partials: project.extra_partials.clone(),
            },
            TemplateCache::new(project.cache_ttl()),
        ));
        let not_found = Arc::new(Responder::new(Arc::clone(&metadata)));

        let mut app = Self {
            project,
            max_body_bytes: config.limits.max_body_bytes,
            metadata,
            engine,
            middleware: Vec::new(),
            mounts: Vec::new(),
            not_found,
        };
        app.mount_statics();
        app
    }

    /// The template engine shared by every bound root.
    pub fn engine(&self) -> &Arc<TemplateEngine> {
        &self.engine
    }

    /// Adds middleware to every root bound after this call.
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    fn mount_statics(&mut self) {
        let root = &self.project.root;
        let parent = root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());

        let mut dirs: Vec<(String, PathBuf)> = self
            .project
            .statics
            .iter()
            .map(|name| {
                let name = name.trim_matches('/');
                (format!("/{name}"), root.join(name))
            })
            .collect();
        dirs.extend(self.project.other_statics.iter().map(|name| {
            let name = name.trim_matches('/');
            (format!("{OTHER_STATICS_PREFIX}/{name}"), parent.join(name))
        }));
        if let Some(vendor) = &self.project.vendor_dir {
            dirs.push((VENDOR_URL.to_string(), root.join(vendor)));
        }
        if dirs.is_empty() {
            return;
        }

        let mut router = Router::new();
        for (url, dir) in &dirs {
            tracing::info!(url = %url, dir = %dir.display(), "Serving static directory");
            router = binder::serve_directory(router, url, dir, Arc::clone(&self.not_found));
        }
        self.mounts.push(Mount {
            label: "statics".to_string(),
            filter: None,
            router: router.fallback(|| async { unmatched_response() }),
        });
    }

    /// Discovers and binds the handlers under `root`.
    pub async fn bind(&mut self, root: impl AsRef<Path>, manifest: Manifest) -> Result<BindReport, BindError> {
        self.bind_mount(root.as_ref(), manifest, None).await
    }

    /// Like [`bind`](Self::bind), but the bound root only answers requests
    /// matching `filter`; others fall through to later roots.
    pub async fn bind_filtered<M>(
        &mut self,
        root: impl AsRef<Path>,
        manifest: Manifest,
        filter: M,
    ) -> Result<BindReport, BindError>
    where
        M: Matcher + 'static,
    {
        self.bind_mount(root.as_ref(), manifest, Some(Arc::new(filter))).await
    }

    async fn bind_mount(
        &mut self,
        root: &Path,
        manifest: Manifest,
        filter: Option<Arc<dyn Matcher>>,
    ) -> Result<BindReport, BindError> {
        if !root.is_dir() {
            return Err(BindError::MissingRoot(root.to_path_buf()));
        }
        let root = root.to_path_buf();

        let loaded = self.engine.load_root(&root).await?;
        let errors_dir = match &self.project.errors_dir {
            Some(dir) => root.join(dir),
            None => root.join(DEFAULT_ERRORS_DIR),
        };
        let templates = ErrorTemplates::load(errors_dir.clone()).await?.map(Arc::new);

        let mut skip = vec![
            root.join(&self.project.partials_dir),
            root.join(&self.project.layouts_dir),
            errors_dir,
        ];
        skip.extend(self.project.statics.iter().map(|name| root.join(name.trim_matches('/'))));
        let scan_root = root.clone();
        let descriptors = tokio::task::spawn_blocking(move || discovery::scan(&scan_root, &skip))
            .await?
            .map_err(|source| BindError::Scan {
                path: root.clone(),
                source,
            })?;

        let mut report = BindReport {
            root: root.clone(),
            partials: loaded.partials,
            layouts: loaded.layouts,
            error_pages: templates.is_some(),
            routes: Vec::new(),
        };
        let mut router = Router::new();
        let mut seen: Vec<String> = Vec::new();

        for descriptor in with_manifest_sources(descriptors, &manifest) {
            let mut model_view = None;
            let endpoint = match descriptor.kind {
                HandlerKind::Api => match manifest.apis.get(&descriptor.source) {
                    Some(endpoint) => Some(Arc::clone(endpoint)),
                    None => {
                        tracing::warn!(source = %descriptor.source, "API file has no registered handler; skipping");
                        None
                    }
                },
                HandlerKind::Controller => {
                    let view = self.controller_view(&root, &descriptor, &manifest);
                    model_view = Some(Arc::new(view.clone()));
                    match manifest.controllers.get(&descriptor.source) {
                        Some(build) => Some(build(view)),
                        None if self.project.auto_bind_controllers => {
                            tracing::debug!(source = %descriptor.source, "Binding view-only controller");
                            let page: Arc<dyn Endpoint> =
                                Arc::new(ControllerEndpoint::new(Arc::new(PageController), view));
                            Some(page)
                        }
                        None => {
                            tracing::warn!(source = %descriptor.source, "Controller file has no registered handler; skipping");
                            None
                        }
                    }
                }
            };

            let Some(endpoint) = endpoint else {
                report.routes.push(RouteEntry {
                    kind: descriptor.kind,
                    source: descriptor.source.clone(),
                    context: descriptor.context.clone(),
                    paths: Vec::new(),
                    bound: false,
                });
                continue;
            };

            if descriptor.kind == HandlerKind::Controller {
                let url = descriptor.assets_url();
                if !seen.contains(&url) {
                    seen.push(format!("{url}/{{*rest}}"));
                    seen.push(url.clone());
                    router = binder::serve_directory(
                        router,
                        &url,
                        &descriptor.assets_dir(&root),
                        Arc::new(Responder::new(Arc::clone(&self.metadata)).with_templates(templates.clone())),
                    );
                }
            }

            let options = endpoint.handler().routes();
            let context = match &options.context {
                Some(context) => format!("/{}", context.trim_matches('/')),
                None => descriptor.context.clone(),
            };
            let paths = binder::route_paths(&context, &options);
            let responder = Arc::new(
                Responder::new(Arc::clone(&self.metadata))
                    .with_headers(options.headers.clone())
                    .with_templates(templates.clone()),
            );
            let bound = Arc::new(BoundEndpoint {
                endpoint,
                responder: Arc::clone(&responder),
                path_config: options.path_config.clone(),
                context: context.clone(),
                max_body_bytes: self.max_body_bytes,
            });
            let (next, mut paths) = binder::bind_endpoint(router, bound, &paths, &options.middleware, &mut seen);
            router = next;
            if let Some(view) = model_view {
                let (next, model_path) = binder::bind_model_json(router, &context, view, responder, &mut seen);
                router = next;
                paths.extend(model_path);
            }

            tracing::info!(
                kind = descriptor.kind.as_str(),
                source = %descriptor.source,
                context = %context,
                routes = paths.len(),
                "Bound handler"
            );
            report.routes.push(RouteEntry {
                kind: descriptor.kind,
                source: descriptor.source,
                context,
                paths,
                bound: true,
            });
        }

        for kind in [HandlerKind::Api, HandlerKind::Controller] {
            let count = report.routes.iter().filter(|r| r.bound && r.kind == kind).count();
            metrics::record_bound_handlers(kind.as_str(), count);
        }

        for m in self.middleware.iter().rev() {
            router = router.layer(axum_middleware::from_fn(binder::run_middleware(Arc::clone(m))));
        }

        self.mounts.push(Mount {
            label: root.display().to_string(),
            filter,
            router: router.fallback(|| async { unmatched_response() }),
        });
        Ok(report)
    }

    fn controller_view(&self, root: &Path, descriptor: &Descriptor, manifest: &Manifest) -> View {
        let model = manifest.models.get(&descriptor.model_source).cloned();
        if model.is_none() {
            tracing::warn!(
                controller = %descriptor.source,
                model = %descriptor.model_source,
                "Model not registered; views render request data"
            );
        }

        let mut view = View::new(Arc::clone(&self.engine), self.project.mode)
            .with_model(descriptor.model_name.clone(), model)
            .with_settings_file(descriptor.config_file(root))
            .with_assets(AssetSource::new(descriptor.assets_dir(root), descriptor.assets_url()));
        let view_file = descriptor.view_file(root);
        if view_file.is_file() {
            view = view.with_view_file(view_file);
        } else {
            tracing::debug!(controller = %descriptor.source, "No view file; rendering empty view");
        }
        view
    }

    /// The router trying every mount in bind order.
    pub fn into_router(self) -> Router {
        let labels: Vec<&str> = self.mounts.iter().map(|m| m.label.as_str()).collect();
        tracing::info!(mounts = ?labels, "Application ready");

        let table = Arc::new(MountTable {
            responder: self.not_found,
            catch_all_404: self.project.catch_all_404,
            max_body_bytes: self.max_body_bytes,
            mounts: self.mounts,
        });
        Router::new().fallback(route_mounts).with_state(table)
    }
}

/// Scanned descriptors plus registered sources with no file on disk.
fn with_manifest_sources(mut descriptors: Vec<Descriptor>, manifest: &Manifest) -> Vec<Descriptor> {
    let known: HashSet<String> = descriptors.iter().map(|d| d.source.clone()).collect();
    let registered: BTreeSet<&String> = manifest.apis.keys().chain(manifest.controllers.keys()).collect();

    for source in registered {
        if known.contains(source) {
            continue;
        }
        match discovery::classify(source) {
            Some(descriptor) => descriptors.push(descriptor),
            None => tracing::warn!(source = %source, "Registered source does not follow naming conventions; skipping"),
        }
    }
    descriptors
}

async fn route_mounts(State(table): State<Arc<MountTable>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, table.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return binder::catalog_error(Arc::clone(&table.responder), parts, ErrorKind::PayloadTooLarge);
        }
    };

    for mount in &table.mounts {
        let request = rebuild(&parts, body.clone());
        if let Some(filter) = &mount.filter {
            if !filter.matches(&request) {
                continue;
            }
        }
        let response = match mount.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        if response.extensions().get::<Unmatched>().is_none() {
            return response;
        }
    }

    if table.catch_all_404 {
        binder::catalog_error(Arc::clone(&table.responder), parts, ErrorKind::NotFound)
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn rebuild(parts: &axum::http::request::Parts, body: Bytes) -> Request {
    let mut request = Request::new(Body::from(body));
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    *request.extensions_mut() = parts.extensions.clone();
    request
}
